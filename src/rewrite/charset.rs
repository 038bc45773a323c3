//! Document encoding for the HTML path.
//!
//! The rewriter works on text, so documents are decoded using the charset
//! declared in `Content-Type` and always re-emitted as UTF-8.

use encoding_rs::{Encoding, UTF_8};

/// The `charset` parameter of a `Content-Type` value, if any.
pub fn declared_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decode a document body. Unknown or missing charsets fall back to UTF-8,
/// with malformed sequences replaced.
pub fn decode_document(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(declared_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Malformed bytes replaced while decoding document");
    }
    decoded.into_owned()
}

/// Restate `content_type` with `charset=utf-8`, keeping every other parameter.
pub fn utf8_content_type(content_type: &str) -> String {
    let mut parts = content_type.split(';');
    let mut rewritten = parts.next().unwrap_or_default().trim().to_string();
    for param in parts {
        let param = param.trim();
        let is_charset = param
            .split_once('=')
            .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("charset"));
        if !param.is_empty() && !is_charset {
            rewritten.push_str("; ");
            rewritten.push_str(param);
        }
    }
    rewritten.push_str("; charset=utf-8");
    rewritten
}
