//! Messages and their content trees.
//!
//! A message body arrives from the mail service as a recursive tree of typed
//! parts. The tree is modelled as a tagged variant so that each extraction
//! rule matches on exactly one shape of node.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::transfer;

/// Identifier of a message within the mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an attachment body stored out-of-line, scoped to its message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body text as delivered by the mail service, still transport-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody(String);

impl EncodedBody {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the body to text, honoring the part's charset when known.
    pub fn decode(&self, charset: Option<&str>) -> String {
        transfer::decode_text(&self.0, charset)
    }
}

/// Media type of a content part, reduced to what extraction cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeType {
    /// `text/plain`
    PlainText,
    /// `text/html`
    Html,
    /// Anything else, lowercased (e.g. `multipart/alternative`, `image/png`).
    Other(String),
}

impl MimeType {
    /// Parse a media type, ignoring parameters and case.
    ///
    /// `"Text/Plain; charset=UTF-8"` → `MimeType::PlainText`
    pub fn parse(raw: &str) -> Self {
        let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Self::PlainText,
            "text/html" => Self::Html,
            _ => Self::Other(essence),
        }
    }

    /// `true` for the two media types whose bodies are read as text.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::PlainText | Self::Html)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PlainText => "text/plain",
            Self::Html => "text/html",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the body of an attachment lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentContent {
    /// Stored out-of-line; must be fetched by `(message id, attachment id)`.
    Remote(AttachmentId),
    /// Carried inline in the part itself.
    Inline(EncodedBody),
    /// Neither a reference nor a body.
    Empty,
}

/// A node of a message's content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// A part without children and without a filename.
    Leaf {
        mime_type: MimeType,
        body: Option<EncodedBody>,
        charset: Option<String>,
    },
    /// A named part. Any children it carries are not walked.
    Attachment {
        mime_type: MimeType,
        filename: String,
        content: AttachmentContent,
        charset: Option<String>,
    },
    /// A part with children. It may also carry a body of its own.
    Container {
        mime_type: MimeType,
        body: Option<EncodedBody>,
        parts: Vec<ContentPart>,
        charset: Option<String>,
    },
}

impl ContentPart {
    /// Build a leaf with an inline body and no charset.
    pub fn leaf(mime_type: &str, body: &str) -> Self {
        Self::Leaf {
            mime_type: MimeType::parse(mime_type),
            body: Some(EncodedBody::new(body)),
            charset: None,
        }
    }

    /// Build a container without a body of its own.
    pub fn container(mime_type: &str, parts: Vec<ContentPart>) -> Self {
        Self::Container {
            mime_type: MimeType::parse(mime_type),
            body: None,
            parts,
            charset: None,
        }
    }

    /// Build an attachment whose body must be fetched remotely.
    pub fn remote_attachment(mime_type: &str, filename: &str, attachment_id: &str) -> Self {
        Self::Attachment {
            mime_type: MimeType::parse(mime_type),
            filename: filename.to_string(),
            content: AttachmentContent::Remote(AttachmentId::new(attachment_id)),
            charset: None,
        }
    }

    /// Build an attachment that carries its body inline.
    pub fn inline_attachment(mime_type: &str, filename: &str, body: &str) -> Self {
        Self::Attachment {
            mime_type: MimeType::parse(mime_type),
            filename: filename.to_string(),
            content: AttachmentContent::Inline(EncodedBody::new(body)),
            charset: None,
        }
    }

    pub fn mime_type(&self) -> &MimeType {
        match self {
            Self::Leaf { mime_type, .. }
            | Self::Attachment { mime_type, .. }
            | Self::Container { mime_type, .. } => mime_type,
        }
    }

    pub fn charset(&self) -> Option<&str> {
        match self {
            Self::Leaf { charset, .. }
            | Self::Attachment { charset, .. }
            | Self::Container { charset, .. } => charset.as_deref(),
        }
    }

    /// The inline body carried by the part itself, if any.
    pub fn own_body(&self) -> Option<&EncodedBody> {
        match self {
            Self::Leaf { body, .. } | Self::Container { body, .. } => body.as_ref(),
            Self::Attachment {
                content: AttachmentContent::Inline(body),
                ..
            } => Some(body),
            Self::Attachment { .. } => None,
        }
    }
}

/// A message fetched from the mailbox: an identifier plus its content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    /// Root of the content tree. Absent for messages the service returned without a payload.
    pub payload: Option<ContentPart>,
}

impl Message {
    pub fn new(id: impl Into<String>, payload: ContentPart) -> Self {
        Self {
            id: MessageId::new(id),
            payload: Some(payload),
        }
    }
}

/// An attachment body fetched out-of-line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentBody {
    pub data: Option<EncodedBody>,
    /// Decoded size reported by the service.
    pub size: Option<u64>,
}

impl AttachmentBody {
    pub fn new(data: &str) -> Self {
        Self {
            data: Some(EncodedBody::new(data)),
            size: None,
        }
    }
}
