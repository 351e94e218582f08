//! Centralized error types for linkscan.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the linkscan library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The attachment source could not deliver an attachment body.
    #[error("Failed to fetch attachment {attachment_id} from message {message_id}: {reason}")]
    AttachmentFetch {
        message_id: String,
        attachment_id: String,
        reason: String,
    },

    /// Text extraction failed for a whole message.
    #[error("Failed to extract the text from message {message_id}: {source}")]
    Extraction {
        message_id: String,
        source: Box<ScanError>,
    },

    /// The content tree is nested deeper than the configured limit.
    #[error("Content tree of message {message_id} is nested deeper than {depth} levels")]
    NestingTooDeep { message_id: String, depth: usize },

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A mailbox dump could not be decoded.
    #[error("Invalid mailbox dump '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A file-link pattern from the configuration is not a valid regex.
    #[error("Invalid file-link pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The public-reachability check could not answer for a URL.
    #[error("Reachability check failed for '{url}': {reason}")]
    Reachability { url: String, reason: String },
}

/// Convenience alias for `Result<T, ScanError>`.
pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a failure with the identifier of the message it happened in.
    pub fn extraction(message_id: impl Into<String>, source: ScanError) -> Self {
        Self::Extraction {
            message_id: message_id.into(),
            source: Box::new(source),
        }
    }
}
