//! Content-tree walker: turns a message's part tree into one text blob.
//!
//! Rules, per node:
//! - A leaf contributes its decoded body when it is `text/plain` or `text/html`.
//! - A container contributes its own decoded body (if it carries one) followed
//!   by one fragment per child, newline-joined in child order.
//! - A `text/plain` attachment contributes its body, fetched remotely when it
//!   is stored out-of-line. Other attachments contribute nothing.
//! - Any other unnamed child is walked as a nested container.
//!
//! Two kinds of branch failure exist, each governed by its own
//! [`FailurePolicy`]: a failed remote attachment fetch and a failed nested
//! walk. With the default configuration the first aborts the message and the
//! second contributes empty text.

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::config::{ExtractConfig, FailurePolicy};
use crate::error::{Result, ScanError};
use crate::model::message::{
    AttachmentContent, AttachmentId, ContentPart, EncodedBody, Message, MessageId, MimeType,
};
use crate::source::attachments::AttachmentSource;

/// Knobs for a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub attachment_failures: FailurePolicy,
    pub nested_part_failures: FailurePolicy,
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

impl From<&ExtractConfig> for WalkOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            attachment_failures: config.attachment_failures,
            nested_part_failures: config.nested_part_failures,
            max_depth: config.max_depth,
        }
    }
}

/// Extracts text from content trees, fetching attachment bodies as needed.
///
/// Holds no per-message state, so one walker can serve many concurrent walks.
pub struct ContentWalker<'a> {
    attachments: &'a dyn AttachmentSource,
    options: WalkOptions,
}

impl<'a> ContentWalker<'a> {
    pub fn new(attachments: &'a dyn AttachmentSource, options: WalkOptions) -> Self {
        Self {
            attachments,
            options,
        }
    }

    /// Extract the text reachable from a message's content tree.
    ///
    /// A message without an identifier or without a payload yields empty text.
    pub async fn extract_text(&self, message: &Message) -> Result<String> {
        let Some(root) = message.payload.as_ref() else {
            return Ok(String::new());
        };
        if message.id.is_empty() {
            return Ok(String::new());
        }
        debug!(message_id = %message.id, "Walking content tree");
        self.walk(&message.id, root, 0).await
    }

    /// Text of a part examined as a tree root (the message payload or a nested container).
    fn walk<'b>(
        &'b self,
        message_id: &'b MessageId,
        part: &'b ContentPart,
        depth: usize,
    ) -> BoxFuture<'b, Result<String>> {
        async move {
            if depth > self.options.max_depth {
                return Err(ScanError::NestingTooDeep {
                    message_id: message_id.to_string(),
                    depth: self.options.max_depth,
                });
            }

            match part {
                ContentPart::Leaf {
                    mime_type,
                    body,
                    charset,
                } => Ok(text_body(mime_type, body.as_ref(), charset.as_deref())),
                ContentPart::Attachment {
                    mime_type,
                    content: AttachmentContent::Inline(body),
                    charset,
                    ..
                } => Ok(text_body(mime_type, Some(body), charset.as_deref())),
                ContentPart::Attachment { .. } => Ok(String::new()),
                ContentPart::Container {
                    body,
                    parts,
                    charset,
                    ..
                } => {
                    let children = join_all(
                        parts
                            .iter()
                            .map(|child| self.child_text(message_id, child, depth + 1)),
                    )
                    .await;

                    let mut pieces = Vec::with_capacity(parts.len() + 1);
                    if let Some(body) = body {
                        pieces.push(body.decode(charset.as_deref()));
                    }
                    for child in children {
                        pieces.push(child?);
                    }
                    Ok(pieces.join("\n"))
                }
            }
        }
        .boxed()
    }

    /// Text contributed by one child of a container.
    async fn child_text(
        &self,
        message_id: &MessageId,
        child: &ContentPart,
        depth: usize,
    ) -> Result<String> {
        match child {
            ContentPart::Attachment {
                mime_type: MimeType::PlainText,
                content,
                charset,
                ..
            } => match content {
                AttachmentContent::Remote(attachment_id) => {
                    self.fetch_text(message_id, attachment_id, charset.as_deref())
                        .await
                }
                AttachmentContent::Inline(body) => Ok(body.decode(charset.as_deref())),
                AttachmentContent::Empty => Ok(String::new()),
            },
            ContentPart::Attachment { filename, .. } => {
                debug!(message_id = %message_id, filename = %filename, "Skipping non-text attachment");
                Ok(String::new())
            }
            part if part.mime_type().is_text() => Ok(part
                .own_body()
                .map(|body| body.decode(part.charset()))
                .unwrap_or_default()),
            part => match self.walk(message_id, part, depth).await {
                Ok(text) => Ok(text),
                Err(e) => isolate(self.options.nested_part_failures, e, message_id),
            },
        }
    }

    /// Fetch and decode a remotely stored text attachment.
    async fn fetch_text(
        &self,
        message_id: &MessageId,
        attachment_id: &AttachmentId,
        charset: Option<&str>,
    ) -> Result<String> {
        debug!(message_id = %message_id, attachment_id = %attachment_id, "Fetching attachment");
        match self.attachments.fetch(message_id, attachment_id).await {
            Ok(attachment) => Ok(attachment
                .data
                .map(|data| data.decode(charset))
                .unwrap_or_default()),
            Err(e) => isolate(self.options.attachment_failures, e, message_id),
        }
    }
}

/// Decoded body of a part read as text, or empty text for any other media type.
fn text_body(mime_type: &MimeType, body: Option<&EncodedBody>, charset: Option<&str>) -> String {
    match body {
        Some(body) if mime_type.is_text() => body.decode(charset),
        _ => String::new(),
    }
}

/// Apply a failure policy to a branch error.
fn isolate(policy: FailurePolicy, error: ScanError, message_id: &MessageId) -> Result<String> {
    match policy {
        FailurePolicy::Propagate => Err(error),
        FailurePolicy::Isolate => {
            warn!(message_id = %message_id, error = %error, "Ignoring failed content branch");
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::model::message::AttachmentBody;
    use crate::source::attachments::InMemoryAttachments;

    /// Attachment source that counts calls and always fails.
    #[derive(Default)]
    struct FailingAttachments {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AttachmentSource for FailingAttachments {
        async fn fetch(
            &self,
            message_id: &MessageId,
            attachment_id: &AttachmentId,
        ) -> Result<AttachmentBody> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::AttachmentFetch {
                message_id: message_id.to_string(),
                attachment_id: attachment_id.to_string(),
                reason: "service unavailable".into(),
            })
        }
    }

    async fn extract(part: ContentPart, source: &dyn AttachmentSource) -> Result<String> {
        extract_with(part, source, WalkOptions::default()).await
    }

    async fn extract_with(
        part: ContentPart,
        source: &dyn AttachmentSource,
        options: WalkOptions,
    ) -> Result<String> {
        let walker = ContentWalker::new(source, options);
        walker.extract_text(&Message::new("m1", part)).await
    }

    #[tokio::test]
    async fn test_single_plain_text_leaf() {
        let none = InMemoryAttachments::new();
        let text = extract(ContentPart::leaf("text/plain", "aGVsbG8="), &none).await;
        assert_eq!(text.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_container_children_joined_in_order() {
        let none = InMemoryAttachments::new();
        let part = ContentPart::container(
            "multipart/alternative",
            vec![
                ContentPart::leaf("text/plain", "aGk="),
                ContentPart::leaf("text/plain", "dGhlcmU="),
            ],
        );
        assert_eq!(extract(part, &none).await.unwrap(), "hi\nthere");
    }

    #[tokio::test]
    async fn test_container_own_body_comes_first() {
        let none = InMemoryAttachments::new();
        let part = ContentPart::Container {
            mime_type: MimeType::parse("multipart/mixed"),
            body: Some(EncodedBody::new("aGVsbG8=")),
            parts: vec![ContentPart::leaf("text/html", "aGk=")],
            charset: None,
        };
        assert_eq!(extract(part, &none).await.unwrap(), "hello\nhi");
    }

    #[tokio::test]
    async fn test_leaf_without_body_or_of_other_type_is_empty() {
        let none = InMemoryAttachments::new();
        let no_body = ContentPart::Leaf {
            mime_type: MimeType::PlainText,
            body: None,
            charset: None,
        };
        assert_eq!(extract(no_body, &none).await.unwrap(), "");

        let image = ContentPart::leaf("image/png", "aGVsbG8=");
        assert_eq!(extract(image, &none).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_message_without_payload_or_id() {
        let none = InMemoryAttachments::new();
        let walker = ContentWalker::new(&none, WalkOptions::default());

        let no_payload = Message {
            id: MessageId::new("m1"),
            payload: None,
        };
        assert_eq!(walker.extract_text(&no_payload).await.unwrap(), "");

        let no_id = Message::new("", ContentPart::leaf("text/plain", "aGk="));
        assert_eq!(walker.extract_text(&no_id).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_remote_text_attachment_is_fetched() {
        let source = InMemoryAttachments::new().with("m1", "att-1", AttachmentBody::new("aGk="));
        let part = ContentPart::container(
            "multipart/mixed",
            vec![
                ContentPart::leaf("text/plain", "aGVsbG8="),
                ContentPart::remote_attachment("text/plain", "notes.txt", "att-1"),
            ],
        );
        assert_eq!(extract(part, &source).await.unwrap(), "hello\nhi");
    }

    #[tokio::test]
    async fn test_inline_text_attachment_is_decoded() {
        let none = InMemoryAttachments::new();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![ContentPart::inline_attachment("text/plain", "notes.txt", "aGk=")],
        );
        assert_eq!(extract(part, &none).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_non_text_attachments_are_skipped_without_fetching() {
        let source = FailingAttachments::default();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![
                ContentPart::leaf("text/plain", "aGk="),
                ContentPart::remote_attachment("application/pdf", "doc.pdf", "att-1"),
                ContentPart::inline_attachment("text/html", "page.html", "aGVsbG8="),
            ],
        );
        assert_eq!(extract(part, &source).await.unwrap(), "hi\n\n");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_attachment_fetch_aborts_message() {
        let source = FailingAttachments::default();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![
                ContentPart::leaf("text/plain", "aGk="),
                ContentPart::remote_attachment("text/plain", "notes.txt", "att-1"),
            ],
        );
        let err = extract(part, &source).await.unwrap_err();
        assert!(matches!(err, ScanError::AttachmentFetch { .. }));
    }

    #[tokio::test]
    async fn test_failed_attachment_fetch_isolated_by_policy() {
        let source = FailingAttachments::default();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![
                ContentPart::leaf("text/plain", "aGk="),
                ContentPart::remote_attachment("text/plain", "notes.txt", "att-1"),
            ],
        );
        let options = WalkOptions {
            attachment_failures: FailurePolicy::Isolate,
            ..WalkOptions::default()
        };
        assert_eq!(extract_with(part, &source, options).await.unwrap(), "hi\n");
    }

    #[tokio::test]
    async fn test_nested_container_is_walked() {
        let none = InMemoryAttachments::new();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![
                ContentPart::container(
                    "multipart/alternative",
                    vec![
                        ContentPart::leaf("text/plain", "aGk="),
                        ContentPart::leaf("text/html", "dGhlcmU="),
                    ],
                ),
                ContentPart::leaf("text/plain", "aGVsbG8="),
            ],
        );
        assert_eq!(extract(part, &none).await.unwrap(), "hi\nthere\nhello");
    }

    #[tokio::test]
    async fn test_failure_inside_nested_container_is_swallowed() {
        let source = FailingAttachments::default();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![
                ContentPart::leaf("text/plain", "aGk="),
                ContentPart::container(
                    "multipart/mixed",
                    vec![
                        ContentPart::leaf("text/plain", "aGVsbG8="),
                        ContentPart::remote_attachment("text/plain", "notes.txt", "att-1"),
                    ],
                ),
            ],
        );
        assert_eq!(extract(part, &source).await.unwrap(), "hi\n");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_inside_nested_container_propagates_by_policy() {
        let source = FailingAttachments::default();
        let part = ContentPart::container(
            "multipart/mixed",
            vec![ContentPart::container(
                "multipart/mixed",
                vec![ContentPart::remote_attachment("text/plain", "notes.txt", "att-1")],
            )],
        );
        let options = WalkOptions {
            nested_part_failures: FailurePolicy::Propagate,
            ..WalkOptions::default()
        };
        assert!(extract_with(part, &source, options).await.is_err());
    }

    #[tokio::test]
    async fn test_text_child_with_children_reads_own_body_only() {
        let none = InMemoryAttachments::new();
        let odd = ContentPart::Container {
            mime_type: MimeType::Html,
            body: Some(EncodedBody::new("aGk=")),
            parts: vec![ContentPart::leaf("text/plain", "aGVsbG8=")],
            charset: None,
        };
        let part = ContentPart::container("multipart/mixed", vec![odd]);
        assert_eq!(extract(part, &none).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_too_deep_nesting() {
        let none = InMemoryAttachments::new();
        let mut part = ContentPart::leaf("text/plain", "aGk=");
        for _ in 0..5 {
            part = ContentPart::container("multipart/mixed", vec![part]);
        }
        let shallow = WalkOptions {
            max_depth: 2,
            nested_part_failures: FailurePolicy::Propagate,
            ..WalkOptions::default()
        };
        let err = extract_with(part.clone(), &none, shallow).await.unwrap_err();
        assert!(matches!(err, ScanError::NestingTooDeep { depth: 2, .. }));

        // Isolated by default: the deep branch contributes nothing.
        let isolated = WalkOptions {
            max_depth: 2,
            ..WalkOptions::default()
        };
        assert_eq!(extract_with(part.clone(), &none, isolated).await.unwrap(), "");

        assert_eq!(extract(part, &none).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_root_attachment_is_read_as_leaf() {
        let none = InMemoryAttachments::new();
        let part = ContentPart::inline_attachment("text/plain", "a.txt", "aGk=");
        assert_eq!(extract(part, &none).await.unwrap(), "hi");

        let remote = ContentPart::remote_attachment("text/plain", "a.txt", "att-1");
        assert_eq!(extract(remote, &none).await.unwrap(), "");
    }
}
