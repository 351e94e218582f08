//! End-to-end scan: messages → links → file links → public file links → unique links.

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::extract::batch::{collect_urls, MessageFailure};
use crate::extract::walker::{ContentWalker, WalkOptions};
use crate::links::classify::FileLinkClassifier;
use crate::links::normalize::dedupe;
use crate::links::reachability::{filter_public, ReachabilityCheck, UrlFailure};
use crate::model::message::Message;
use crate::model::url::UrlSet;
use crate::source::attachments::AttachmentSource;

/// Result of one scan. Nothing in it outlives the run that produced it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Number of messages submitted.
    pub messages: usize,
    /// Every link found, in message order.
    pub all_urls: Vec<String>,
    /// Links recognized as hosted files.
    pub file_urls: Vec<String>,
    /// File links the reachability check reported as public.
    pub public_urls: Vec<String>,
    /// Public file links without query strings, each once.
    pub unique_urls: UrlSet,
    /// Messages that contributed nothing because extraction failed.
    pub failures: Vec<MessageFailure>,
    /// Links the reachability check could not decide on.
    pub url_failures: Vec<UrlFailure>,
}

/// Runs scans against one attachment source and one reachability check.
pub struct Scanner<'a> {
    attachments: &'a dyn AttachmentSource,
    reachability: &'a dyn ReachabilityCheck,
    classifier: FileLinkClassifier,
    walk: WalkOptions,
    max_concurrent_messages: usize,
}

impl<'a> Scanner<'a> {
    /// Scanner with default settings and the built-in file-link patterns.
    pub fn new(
        attachments: &'a dyn AttachmentSource,
        reachability: &'a dyn ReachabilityCheck,
    ) -> Self {
        let config = Config::default();
        Self {
            attachments,
            reachability,
            classifier: FileLinkClassifier::builtin(),
            walk: WalkOptions::from(&config.extract),
            max_concurrent_messages: config.extract.max_concurrent_messages,
        }
    }

    /// Scanner configured from `config`.
    ///
    /// Fails when a configured file-link pattern is not a valid regex.
    pub fn from_config(
        attachments: &'a dyn AttachmentSource,
        reachability: &'a dyn ReachabilityCheck,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            attachments,
            reachability,
            classifier: FileLinkClassifier::from_config(&config.links)?,
            walk: WalkOptions::from(&config.extract),
            max_concurrent_messages: config.extract.max_concurrent_messages,
        })
    }

    /// Replace the file-link classifier.
    pub fn with_classifier(mut self, classifier: FileLinkClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Scan `messages`.
    ///
    /// The progress callback receives `(settled, total)` as message extractions finish.
    pub async fn run(
        &self,
        messages: &[Message],
        progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> ScanReport {
        let walker = ContentWalker::new(self.attachments, self.walk);
        let batch = collect_urls(&walker, messages, self.max_concurrent_messages, progress).await;

        let file_urls = self.classifier.filter_file_urls(&batch.urls);
        let (public_urls, url_failures) = filter_public(&file_urls, self.reachability).await;
        let unique_urls = dedupe(&public_urls);

        info!(
            messages = messages.len(),
            failed = batch.failures.len(),
            links = batch.urls.len(),
            file_links = file_urls.len(),
            public = public_urls.len(),
            unique = unique_urls.len(),
            "Scan finished"
        );

        ScanReport {
            messages: messages.len(),
            all_urls: batch.urls,
            file_urls,
            public_urls,
            unique_urls,
            failures: batch.failures,
            url_failures,
        }
    }
}
