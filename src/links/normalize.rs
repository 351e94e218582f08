//! Link normalization and deduplication.

use std::fmt::Write as _;

use tracing::debug;
use url::Url;

use crate::model::url::UrlSet;

/// Reduce a link to `scheme://host[:port]/path`, dropping query, fragment and credentials.
///
/// Strings that do not parse as a URL with a host are returned unchanged.
/// Normalizing an already normalized link returns it unchanged.
pub fn normalize(raw: &str) -> String {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            debug!(url = raw, error = %e, "Keeping unparseable link as-is");
            return raw.to_string();
        }
    };

    let Some(host) = parsed.host_str() else {
        return raw.to_string();
    };

    let mut out = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        let _ = write!(out, ":{port}");
    }
    out.push_str(parsed.path());
    out
}

/// Normalize every link and collapse duplicates.
pub fn dedupe<I, S>(urls: I) -> UrlSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    urls.into_iter().map(|url| normalize(url.as_ref())).collect()
}
