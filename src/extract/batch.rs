//! Batch collection: per-message extraction fanned out over a whole mailbox.
//!
//! Every message is extracted independently and every extraction is allowed
//! to settle. A failing message is recorded in [`BatchOutcome::failures`] and
//! contributes no links; it never stops the others.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, ScanError};
use crate::model::message::{Message, MessageId};

use super::urls::extract_urls;
use super::walker::ContentWalker;

/// A message whose extraction failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageFailure {
    pub message_id: MessageId,
    pub reason: String,
}

/// Links gathered from a batch of messages plus the per-message failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Links of all successful messages, in message order.
    pub urls: Vec<String>,
    /// Number of messages extracted successfully.
    pub succeeded: usize,
    pub failures: Vec<MessageFailure>,
}

/// Extract the links of a single message.
///
/// Failures are wrapped with the message identifier.
pub async fn urls_from_message(walker: &ContentWalker<'_>, message: &Message) -> Result<Vec<String>> {
    let text = walker
        .extract_text(message)
        .await
        .map_err(|e| ScanError::extraction(message.id.as_str(), e))?;
    let urls = extract_urls(&text);
    debug!(message_id = %message.id, links = urls.len(), "Extracted links");
    Ok(urls)
}

/// Extract links from every message, at most `concurrency` at a time.
///
/// The progress callback receives `(settled, total)` each time a message
/// finishes, successfully or not.
pub async fn collect_urls(
    walker: &ContentWalker<'_>,
    messages: &[Message],
    concurrency: usize,
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> BatchOutcome {
    let total = messages.len();
    let settled = AtomicUsize::new(0);

    let results: Vec<(&Message, Result<Vec<String>>)> = stream::iter(messages)
        .map(|message| {
            let settled = &settled;
            async move {
                let result = urls_from_message(walker, message).await;
                let done = settled.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(report) = progress {
                    report(done, total);
                }
                (message, result)
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = BatchOutcome::default();
    for (message, result) in results {
        match result {
            Ok(urls) => {
                outcome.succeeded += 1;
                outcome.urls.extend(urls);
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Skipping message");
                outcome.failures.push(MessageFailure {
                    message_id: message.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}
