//! Hyperlink extraction from free text.

use std::sync::LazyLock;

use regex::Regex;

/// Candidate links: an `http(s)://` or `www.` prefix followed by anything
/// that cannot terminate a link in prose or markup.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'`]+"#).expect("valid link regex")
});

/// Where a second link starts inside one candidate: any scheme, or a `www.`
/// host right after a list or markup separator.
static EMBEDDED_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://|[(\[{,;|]www\.").expect("valid link start regex")
});

/// HTML character references that end a link when no whitespace follows them.
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&(?:nbsp|lt|gt|quot|apos|#[0-9]+|#x[0-9a-f]+);").expect("valid entity regex")
});

/// Find every hyperlink embedded in `text`, in order of appearance.
///
/// Repeated links are returned once per occurrence; deduplication happens
/// later, across all messages. Scheme-less `www.` links get an `http://`
/// prefix.
pub fn extract_urls(text: &str) -> Vec<String> {
    LINK_RE
        .find_iter(text)
        .flat_map(|m| split_embedded(m.as_str()))
        .filter_map(clean_candidate)
        .collect()
}

/// Split a candidate wherever another link begins, so that
/// `[a](b)` and `a,b` give two links.
fn split_embedded(raw: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in EMBEDDED_START_RE.find_iter(raw) {
        // The `www.` alternative matches its separator too.
        let at = if m.as_str().starts_with(['h', 'H']) {
            m.start()
        } else {
            m.start() + 1
        };
        if at > start {
            pieces.push(&raw[start..at]);
            start = at;
        }
    }
    pieces.push(&raw[start..]);
    pieces
}

/// Trim a raw regex match down to the link itself.
fn clean_candidate(raw: &str) -> Option<String> {
    let decoded = raw
        .replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&#x26;", "&");
    let mut link = match ENTITY_RE.find(&decoded) {
        Some(entity) => decoded[..entity.start()].to_string(),
        None => decoded,
    };

    while let Some(last) = link.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '*' | '|' | '(' | '[' | '{' => true,
            ')' => unbalanced(&link, '(', ')'),
            ']' => unbalanced(&link, '[', ']'),
            '}' => unbalanced(&link, '{', '}'),
            _ => false,
        };
        if !strip {
            break;
        }
        link.pop();
    }

    let lower = link.to_ascii_lowercase();
    let rest = ["https://", "http://", "www."]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))?;
    if rest.is_empty() || rest.starts_with(['/', '.']) {
        return None;
    }

    if lower.starts_with("www.") {
        link.insert_str(0, "http://");
    }
    Some(link)
}

/// `true` when `s` has more `close` than `open` characters.
fn unbalanced(s: &str, open: char, close: char) -> bool {
    let opens = s.chars().filter(|&c| c == open).count();
    let closes = s.chars().filter(|&c| c == close).count();
    closes > opens
}
