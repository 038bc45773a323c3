//! Outbound request construction and dispatch.
//!
//! # Responsibilities
//! - Turn an inbound request into the request sent to the target origin
//! - Sanitize headers (see `security::headers`)
//! - Drop the body for GET/HEAD
//! - Send through a client that never follows redirects
//!
//! # Design Decisions
//! - `build` is pure so the outbound shape can be tested without a network
//! - Redirects come back to the caller as 3xx responses, to be rewritten
//! - No retries: an origin failure is reported immediately

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method};
use url::Url;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::security::headers::sanitize_request_headers;
use crate::upstream::UpstreamError;

/// A fully prepared request for the target origin.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` for methods that carry no body.
    pub body: Option<Bytes>,
}

/// Issues requests to arbitrary origins.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    user_agent: HeaderValue,
}

impl Forwarder {
    /// Create a forwarder with a manual-redirect client.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let user_agent = HeaderValue::from_str(&upstream.user_agent)
            .map_err(|_| UpstreamError::InvalidUserAgent)?;

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs));
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(UpstreamError::Client)?;

        Ok(Self { client, user_agent })
    }

    /// Build the outbound request for `target` from the inbound parts.
    pub fn build(&self, method: &Method, headers: &HeaderMap, body: Bytes, target: &Url) -> OutboundRequest {
        let body = if method == Method::GET || method == Method::HEAD {
            None
        } else {
            Some(body)
        };

        OutboundRequest {
            method: method.clone(),
            url: target.clone(),
            headers: sanitize_request_headers(headers, target, &self.user_agent),
            body,
        }
    }

    /// Send a prepared request to its origin.
    pub async fn send(&self, request: OutboundRequest) -> Result<reqwest::Response, UpstreamError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        builder.send().await.map_err(UpstreamError::Send)
    }
}
