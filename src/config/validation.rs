//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that rewrite endpoints produce usable links
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An address field does not parse as `ip:port`.
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    /// A duration or size that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// The proxy path cannot host the proxy endpoint.
    #[error("rewrite.proxy_path must start with '/' and not be the root path, got '{0}'")]
    InvalidProxyPath(String),

    /// The public origin is not a bare absolute http(s) origin.
    #[error("rewrite.public_origin must be an absolute http(s) origin, got '{0}'")]
    InvalidPublicOrigin(String),

    /// The inbound budget would expire before the outbound call can report its own timeout.
    #[error("timeouts.request_secs ({request}) must be greater than timeouts.upstream_secs ({upstream})")]
    RequestBudgetTooShort { request: u64, upstream: u64 },

    /// The configured User-Agent cannot be sent as a header.
    #[error("upstream.user_agent is not a valid header value")]
    InvalidUserAgent,
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        "listener.bind_address",
        &config.listener.bind_address,
        &mut errors,
    );
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.request_secs != 0 && config.timeouts.request_secs <= config.timeouts.upstream_secs {
        errors.push(ValidationError::RequestBudgetTooShort {
            request: config.timeouts.request_secs,
            upstream: config.timeouts.upstream_secs,
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }
    if config.upstream.max_request_body_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.max_request_body_bytes"));
    }

    if HeaderValue::from_str(&config.upstream.user_agent).is_err() {
        errors.push(ValidationError::InvalidUserAgent);
    }

    let path = &config.rewrite.proxy_path;
    if !path.starts_with('/') || path == "/" || path.contains(['?', '#']) {
        errors.push(ValidationError::InvalidProxyPath(path.clone()));
    }

    if let Some(origin) = &config.rewrite.public_origin {
        if !is_bare_origin(origin) {
            errors.push(ValidationError::InvalidPublicOrigin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn is_bare_origin(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.has_host()
                && url.path() == "/"
                && url.query().is_none()
                && url.fragment().is_none()
        }
        Err(_) => false,
    }
}
