//! Header manipulation and sanitization.
//!
//! # Responsibilities
//! - Filter client headers before they reach the origin
//! - Strip hop-by-hop headers in both directions
//! - Remove response headers that stop a page from working through the proxy
//!
//! # Design Decisions
//! - Nothing identifying the client's page (`Origin`, `Referer`, `Sec-*`) is forwarded
//! - The origin always sees one fixed browser identity
//! - Framing (`content-length`, `transfer-encoding`) is recomputed, never copied

use axum::http::header::{
    self, HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use url::Url;

use crate::http::X_REQUEST_ID;

/// Connection-scoped headers that must not be forwarded by a proxy.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Response headers that would block the page when served from another host.
const EMBEDDING_BLOCKERS: [&str; 3] = [
    "content-security-policy",
    "content-security-policy-report-only",
    "x-frame-options",
];

/// Returns true if a client header may be forwarded to the origin.
pub fn is_forwardable(name: &HeaderName) -> bool {
    // HeaderName is always lowercase.
    let name = name.as_str();
    !(name.starts_with("sec-")
        || name == "origin"
        || name == "referer"
        || name == "host"
        || name == "content-length"
        || name == "accept-encoding"
        || name == X_REQUEST_ID
        || HOP_BY_HOP.contains(&name))
}

/// Build the SanitizedHeaderSet sent to the origin.
///
/// Keeps every forwardable client header (with its multiplicity), then sets
/// the fixed User-Agent and a Referer naming the target's origin.
pub fn sanitize_request_headers(
    inbound: &HeaderMap,
    target: &Url,
    user_agent: &HeaderValue,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 2);
    for (name, value) in inbound {
        if is_forwardable(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    headers.insert(header::USER_AGENT, user_agent.clone());
    if let Ok(referer) = HeaderValue::from_str(&target.origin().ascii_serialization()) {
        headers.insert(header::REFERER, referer);
    }
    headers
}

/// Remove hop-by-hop and framing headers from an origin response.
pub fn strip_transport_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::CONTENT_LENGTH);
}

/// Remove CSP and frame-options headers from an origin response.
pub fn strip_embedding_blockers(headers: &mut HeaderMap) {
    for name in EMBEDDING_BLOCKERS {
        headers.remove(name);
    }
}

/// Allow any origin to read the proxied response.
pub fn allow_any_origin(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Headers answering a CORS preflight.
pub fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    allow_any_origin(&mut headers);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers
}
