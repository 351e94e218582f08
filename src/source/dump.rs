//! Mailbox dumps: message resources saved from the mail service as JSON.
//!
//! Three layouts are accepted:
//! - a bare array of message resources;
//! - an object with `messages` and, optionally, `attachments` keyed by
//!   message id then attachment id, each value shaped like a service
//!   attachment response (`{"size": .., "data": ".."}`);
//! - a single message resource with an `id`.
//!
//! Any other object is rejected rather than read as an empty mailbox.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Result, ScanError};
use crate::model::message::Message;
use crate::parser::payload::{RawBody, RawMessage, RawPart};

use super::attachments::InMemoryAttachments;

/// Messages and any attachment bodies stored alongside them.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pub messages: Vec<Message>,
    pub attachments: InMemoryAttachments,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DumpFile {
    Messages(Vec<RawMessage>),
    Full(FullDump),
    Single(SingleMessage),
}

#[derive(Deserialize)]
struct FullDump {
    messages: Vec<RawMessage>,
    #[serde(default)]
    attachments: HashMap<String, HashMap<String, RawBody>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleMessage {
    id: String,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    payload: Option<RawPart>,
}

impl From<SingleMessage> for RawMessage {
    fn from(single: SingleMessage) -> Self {
        RawMessage {
            id: Some(single.id),
            thread_id: single.thread_id,
            payload: single.payload,
        }
    }
}

/// Load a mailbox dump from disk.
pub fn load_dump(path: &Path) -> Result<Mailbox> {
    let contents = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
    let mailbox = parse_dump(&contents, path)?;
    info!(
        path = %path.display(),
        messages = mailbox.messages.len(),
        attachments = mailbox.attachments.len(),
        "Loaded mailbox dump"
    );
    Ok(mailbox)
}

/// Parse a mailbox dump; `path` is only used for error context.
pub fn parse_dump(contents: &str, path: &Path) -> Result<Mailbox> {
    let dump: DumpFile = serde_json::from_str(contents).map_err(|source| ScanError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let (raw_messages, raw_attachments) = match dump {
        DumpFile::Messages(messages) => (messages, HashMap::new()),
        DumpFile::Full(full) => (full.messages, full.attachments),
        DumpFile::Single(single) => (vec![single.into()], HashMap::new()),
    };

    let mut attachments = InMemoryAttachments::new();
    for (message_id, bodies) in raw_attachments {
        for (attachment_id, body) in bodies {
            attachments.insert(&message_id, &attachment_id, body.into());
        }
    }

    Ok(Mailbox {
        messages: raw_messages.into_iter().map(Message::from).collect(),
        attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[{"id":"m1","payload":{"mimeType":"text/plain","body":{"data":"aGk="}}},{"id":"m2"}]"#;
        let mailbox = parse_dump(json, Path::new("dump.json")).unwrap();
        assert_eq!(mailbox.messages.len(), 2);
        assert_eq!(mailbox.messages[0].id.as_str(), "m1");
        assert!(mailbox.messages[1].payload.is_none());
        assert!(mailbox.attachments.is_empty());
    }

    #[test]
    fn test_parse_full_dump_with_attachments() {
        let json = r#"{
            "messages": [{"id":"m1","payload":{"mimeType":"multipart/mixed","parts":[
                {"mimeType":"text/plain","filename":"notes.txt","body":{"attachmentId":"a1"}}]}}],
            "attachments": {"m1": {"a1": {"size": 2, "data": "aGk="}}}
        }"#;
        let mailbox = parse_dump(json, Path::new("dump.json")).unwrap();
        assert_eq!(mailbox.messages.len(), 1);
        assert_eq!(mailbox.attachments.len(), 1);
    }

    #[test]
    fn test_parse_single_message() {
        let json = r#"{"id":"m1","threadId":"t1","payload":{"mimeType":"text/plain","body":{"data":"aGk="}}}"#;
        let mailbox = parse_dump(json, Path::new("message.json")).unwrap();
        assert_eq!(mailbox.messages.len(), 1);
        assert_eq!(mailbox.messages[0].id.as_str(), "m1");
        assert!(mailbox.messages[0].payload.is_some());
    }

    #[test]
    fn test_parse_full_dump_without_attachments() {
        let json = r#"{"messages": [{"id":"m1"}, {"id":"m2"}]}"#;
        let mailbox = parse_dump(json, Path::new("dump.json")).unwrap();
        assert_eq!(mailbox.messages.len(), 2);
        assert!(mailbox.attachments.is_empty());
    }

    #[test]
    fn test_misspelled_messages_key_is_rejected() {
        let err = parse_dump(r#"{"mesages":[{"id":"m1"}]}"#, Path::new("typo.json")).unwrap_err();
        assert!(matches!(err, ScanError::Json { .. }));
    }

    #[test]
    fn test_unrelated_object_is_rejected() {
        for json in [r#"{}"#, r#"{"attachments": {}}"#, r#"{"id": 7}"#] {
            let err = parse_dump(json, Path::new("dump.json")).unwrap_err();
            assert!(matches!(err, ScanError::Json { .. }), "{json}");
        }
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_dump("{not json", Path::new("broken.json")).unwrap_err();
        assert!(matches!(err, ScanError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_dump(Path::new("/nonexistent/dump.json")).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }
}
