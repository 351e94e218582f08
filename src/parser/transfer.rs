//! Transport decoding of part bodies.
//!
//! The mail service delivers bodies as base64 text (usually the URL-safe
//! alphabet, sometimes padded, sometimes not). Decoding is best-effort: it
//! never fails, because a single bad leaf must not abort the walk above it.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use tracing::warn;

/// Standard-alphabet engine that accepts input with or without padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode transport-encoded text into raw bytes.
///
/// - Both the standard (`+/`) and URL-safe (`-_`) alphabets are accepted.
/// - Whitespace, padding and any other characters outside the alphabet are dropped.
/// - A dangling final character that cannot form a byte is discarded.
pub fn decode_bytes(input: &str) -> Vec<u8> {
    let mut cleaned: Vec<u8> = input
        .bytes()
        .filter_map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' => Some(b),
            b'-' => Some(b'+'),
            b'_' => Some(b'/'),
            _ => None,
        })
        .collect();

    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    match LENIENT.decode(&cleaned) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Undecodable body, treating as empty");
            Vec::new()
        }
    }
}

/// Decode transport-encoded text and render it with the given charset.
///
/// Unknown or missing charsets fall back to lossy UTF-8.
pub fn decode_text(input: &str, charset: Option<&str>) -> String {
    let bytes = decode_bytes(input);
    match charset {
        Some(charset) => decode_charset(charset, &bytes),
        None => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Decode a body with no charset information.
pub fn decode(input: &str) -> String {
    decode_text(input, None)
}

/// Decode bytes using a named charset.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let charset_lower = charset.to_lowercase();
    match charset_lower.as_str() {
        "utf-8" | "utf8" | "us-ascii" => String::from_utf8_lossy(bytes).into_owned(),
        _ => {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(bytes);
                decoded.into_owned()
            } else {
                warn!(
                    charset = charset,
                    "Unknown charset, falling back to UTF-8 lossy"
                );
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}
