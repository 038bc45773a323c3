//! Request-level errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::security::headers::allow_any_origin;
use crate::upstream::{describe, UpstreamError};

/// Everything that can end a proxied exchange early.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No `url` query parameter.
    #[error("No target URL given. Pass it as the `url` query parameter.")]
    MissingTarget,

    /// The `url` parameter is not an absolute URL.
    #[error("Invalid target URL.")]
    InvalidTarget(#[source] url::ParseError),

    /// The origin could not be reached.
    #[error("Error fetching target URL: {0}")]
    Upstream(#[from] UpstreamError),

    /// The origin's body could not be read.
    #[error("Error reading target response: {}", describe(.0))]
    UpstreamBody(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget | ProxyError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) | ProxyError::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        allow_any_origin(response.headers_mut());
        response
    }
}
