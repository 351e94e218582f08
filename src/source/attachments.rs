//! Attachment bodies stored out-of-line.
//!
//! The walker only needs one operation from the mail service: fetch the body
//! of an attachment by `(message id, attachment id)`. Implementations must be
//! safe to call concurrently from many message walks.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::model::message::{AttachmentBody, AttachmentId, MessageId};

/// Read access to attachment bodies.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    /// Fetches one attachment body.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::AttachmentFetch`] when the body is unavailable.
    async fn fetch(
        &self,
        message_id: &MessageId,
        attachment_id: &AttachmentId,
    ) -> Result<AttachmentBody>;
}

/// Attachment bodies held in memory, keyed by message and attachment id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttachments {
    bodies: HashMap<(String, String), AttachmentBody>,
}

impl InMemoryAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, message_id: &str, attachment_id: &str, body: AttachmentBody) {
        self.bodies
            .insert((message_id.to_string(), attachment_id.to_string()), body);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, message_id: &str, attachment_id: &str, body: AttachmentBody) -> Self {
        self.insert(message_id, attachment_id, body);
        self
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

#[async_trait]
impl AttachmentSource for InMemoryAttachments {
    async fn fetch(
        &self,
        message_id: &MessageId,
        attachment_id: &AttachmentId,
    ) -> Result<AttachmentBody> {
        let key = (
            message_id.as_str().to_string(),
            attachment_id.as_str().to_string(),
        );
        self.bodies
            .get(&key)
            .cloned()
            .ok_or_else(|| ScanError::AttachmentFetch {
                message_id: message_id.to_string(),
                attachment_id: attachment_id.to_string(),
                reason: "attachment not found".into(),
            })
    }
}

/// Attachment bodies stored as files at `<root>/<message id>/<attachment id>`.
///
/// Each file holds the transport-encoded body exactly as the service returns it.
#[derive(Debug, Clone)]
pub struct DirectoryAttachments {
    root: PathBuf,
}

impl DirectoryAttachments {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn body_path(&self, message_id: &MessageId, attachment_id: &AttachmentId) -> Option<PathBuf> {
        let safe = |s: &str| {
            !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
        };
        (safe(message_id.as_str()) && safe(attachment_id.as_str())).then(|| {
            self.root
                .join(message_id.as_str())
                .join(attachment_id.as_str())
        })
    }
}

#[async_trait]
impl AttachmentSource for DirectoryAttachments {
    async fn fetch(
        &self,
        message_id: &MessageId,
        attachment_id: &AttachmentId,
    ) -> Result<AttachmentBody> {
        let fetch_error = |reason: String| ScanError::AttachmentFetch {
            message_id: message_id.to_string(),
            attachment_id: attachment_id.to_string(),
            reason,
        };

        let path = self
            .body_path(message_id, attachment_id)
            .ok_or_else(|| fetch_error("identifier is not a valid file name".into()))?;

        debug!(path = %path.display(), "Reading attachment body");
        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| fetch_error(format!("{}: {e}", path.display())))?;

        Ok(AttachmentBody::new(data.trim()))
    }
}
