//! Public-reachability check: the boundary to whatever decides if a file link
//! can be opened without signing in.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// Answers whether a file link is reachable without authentication.
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScanError::Reachability`](crate::error::ScanError::Reachability)
    /// when the check cannot reach a verdict.
    async fn is_public(&self, url: &str) -> Result<bool>;
}

/// Treats every link as public. Used when no remote check is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumePublic;

#[async_trait]
impl ReachabilityCheck for AssumePublic {
    async fn is_public(&self, _url: &str) -> Result<bool> {
        Ok(true)
    }
}

/// A link the reachability check could not decide on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlFailure {
    pub url: String,
    pub reason: String,
}

/// Check every link concurrently and keep the public ones, in input order.
///
/// A link whose check fails is left out and reported; it never stops the others.
pub async fn filter_public(
    urls: &[String],
    check: &dyn ReachabilityCheck,
) -> (Vec<String>, Vec<UrlFailure>) {
    let verdicts = join_all(urls.iter().map(|url| check.is_public(url))).await;

    let mut public = Vec::new();
    let mut failures = Vec::new();
    for (url, verdict) in urls.iter().zip(verdicts) {
        match verdict {
            Ok(true) => public.push(url.clone()),
            Ok(false) => {}
            Err(e) => {
                warn!(url = %url, error = %e, "Reachability check failed");
                failures.push(UrlFailure {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (public, failures)
}
