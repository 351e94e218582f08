//! Mail-service message resources and their conversion into content trees.
//!
//! The service describes every part with the same loose shape (`mimeType`,
//! `filename`, `headers`, `body`, `parts`). Conversion decides once which
//! variant of [`ContentPart`] a part is, so extraction never re-inspects
//! optional fields.

use serde::{Deserialize, Serialize};

use crate::model::message::{
    AttachmentBody, AttachmentContent, AttachmentId, ContentPart, EncodedBody, Message, MessageId,
    MimeType,
};

/// A message resource as returned by the mail service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMessage {
    pub id: Option<String>,
    pub thread_id: Option<String>,
    pub payload: Option<RawPart>,
}

/// One part of a message resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPart {
    pub part_id: Option<String>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    pub headers: Option<Vec<RawHeader>>,
    pub body: Option<RawBody>,
    pub parts: Option<Vec<RawPart>>,
}

/// A single `name: value` header of a part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

/// Body descriptor of a part, also the shape of a fetched attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawBody {
    pub attachment_id: Option<String>,
    pub size: Option<u64>,
    pub data: Option<String>,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        Self {
            id: MessageId::new(raw.id.unwrap_or_default()),
            payload: raw.payload.map(ContentPart::from),
        }
    }
}

impl From<RawPart> for ContentPart {
    fn from(raw: RawPart) -> Self {
        let mime_type = MimeType::parse(raw.mime_type.as_deref().unwrap_or(""));
        let charset = raw.headers.as_deref().and_then(charset_from_headers);
        let body = raw.body.unwrap_or_default();
        let data = non_empty(body.data).map(EncodedBody::new);

        if let Some(filename) = non_empty(raw.filename) {
            let content = match (non_empty(body.attachment_id), data) {
                (Some(id), _) => AttachmentContent::Remote(AttachmentId::new(id)),
                (None, Some(data)) => AttachmentContent::Inline(data),
                (None, None) => AttachmentContent::Empty,
            };
            return Self::Attachment {
                mime_type,
                filename,
                content,
                charset,
            };
        }

        match raw.parts {
            Some(parts) if !parts.is_empty() => Self::Container {
                mime_type,
                body: data,
                parts: parts.into_iter().map(ContentPart::from).collect(),
                charset,
            },
            _ => Self::Leaf {
                mime_type,
                body: data,
                charset,
            },
        }
    }
}

impl From<RawBody> for AttachmentBody {
    fn from(raw: RawBody) -> Self {
        Self {
            data: non_empty(raw.data).map(EncodedBody::new),
            size: raw.size,
        }
    }
}

/// The service uses empty strings for absent values.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Extract the `charset` parameter of the part's `Content-Type` header.
fn charset_from_headers(headers: &[RawHeader]) -> Option<String> {
    let content_type = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-type"))?;

    content_type.value.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
