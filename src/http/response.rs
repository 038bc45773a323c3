//! Response dispatch: turn an origin response into the client response.
//!
//! # Responsibilities
//! - Classify the origin response (redirect / HTML / anything else)
//! - Apply the matching header and body rewrites
//! - Answer CORS preflights without contacting the origin
//!
//! # Design Decisions
//! - Every request visits exactly one `HandlingPath`
//! - Redirects keep their status code and lose their body
//! - Non-HTML bodies are re-emitted byte-for-byte
//! - Hop-by-hop headers stripped automatically

use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

use crate::rewrite::{
    decode_document, rewrite_html, rewrite_location, rewrite_set_cookies, utf8_content_type,
    RewriteContext,
};
use crate::security::headers::{
    allow_any_origin, preflight_headers, strip_embedding_blockers, strip_transport_headers,
};

/// The handling state selected for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlingPath {
    /// `OPTIONS` answered locally.
    Preflight,
    /// The origin was contacted and its response handled as classified.
    Origin(OriginPath),
}

impl HandlingPath {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlingPath::Preflight => "preflight",
            HandlingPath::Origin(OriginPath::Redirecting) => "redirect",
            HandlingPath::Origin(OriginPath::RenderingHtml) => "html",
            HandlingPath::Origin(OriginPath::Passthrough) => "passthrough",
        }
    }
}

impl fmt::Display for HandlingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an origin response is turned into the client response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginPath {
    /// 3xx with a `Location` to route back through the proxy.
    Redirecting,
    /// HTML document whose links are rewritten.
    RenderingHtml,
    /// Any other body, re-emitted unchanged.
    Passthrough,
}

impl OriginPath {
    /// Pick the handling path for an origin response.
    pub fn classify(status: StatusCode, headers: &HeaderMap) -> Self {
        if status.is_redirection() && headers.contains_key(LOCATION) {
            OriginPath::Redirecting
        } else if is_html(headers) {
            OriginPath::RenderingHtml
        } else {
            OriginPath::Passthrough
        }
    }

    /// Whether the origin body must be read for this path.
    pub fn needs_body(self) -> bool {
        matches!(self, OriginPath::RenderingHtml | OriginPath::Passthrough)
    }
}

impl From<OriginPath> for HandlingPath {
    fn from(path: OriginPath) -> Self {
        HandlingPath::Origin(path)
    }
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

/// Empty response carrying the CORS allow headers.
pub fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    *response.headers_mut() = preflight_headers();
    response
}

/// Build the client response for an origin response already classified as `path`.
///
/// `body` is ignored on the redirect path.
pub fn dispatch(
    path: OriginPath,
    ctx: &RewriteContext,
    inject_base: bool,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match path {
        OriginPath::Redirecting => redirect(ctx, status, headers),
        OriginPath::RenderingHtml => html(ctx, inject_base, status, headers, &body),
        OriginPath::Passthrough => passthrough(status, headers, body),
    }
}

fn redirect(ctx: &RewriteContext, status: StatusCode, mut headers: HeaderMap) -> Response {
    let rewritten = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|location| rewrite_location(location, ctx))
        .and_then(|location| HeaderValue::from_str(&location).ok());
    if let Some(location) = rewritten {
        headers.insert(LOCATION, location);
    }

    rewrite_set_cookies(&mut headers);
    strip_transport_headers(&mut headers);
    allow_any_origin(&mut headers);
    build(status, headers, Body::empty())
}

fn html(
    ctx: &RewriteContext,
    inject_base: bool,
    status: StatusCode,
    mut headers: HeaderMap,
    body: &[u8],
) -> Response {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let text = decode_document(body, content_type);
    let rewritten = rewrite_html(&text, ctx, inject_base);
    if let Some(value) = content_type.map(utf8_content_type) {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(CONTENT_TYPE, value);
        }
    }

    rewrite_set_cookies(&mut headers);
    strip_embedding_blockers(&mut headers);
    strip_transport_headers(&mut headers);
    allow_any_origin(&mut headers);
    build(status, headers, Body::from(rewritten))
}

fn passthrough(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Response {
    strip_transport_headers(&mut headers);
    allow_any_origin(&mut headers);
    build(status, headers, Body::from(body))
}

fn build(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
