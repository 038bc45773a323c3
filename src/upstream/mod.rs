//! Outbound (origin-facing) subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request parts + target URL
//!     → forwarder.rs build() (sanitize headers, drop GET/HEAD body)
//!     → forwarder.rs send()  (reqwest, manual redirects)
//!     → reqwest::Response handed to the dispatcher
//! ```

pub mod forwarder;

use std::error::Error as StdError;

use thiserror::Error;

pub use forwarder::{Forwarder, OutboundRequest};

/// Errors raised while talking to the target origin.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The outbound client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured User-Agent is not a valid header value.
    #[error("invalid User-Agent header value")]
    InvalidUserAgent,

    /// The request could not be sent or no response arrived.
    #[error("{}", describe(.0))]
    Send(#[source] reqwest::Error),
}

/// Render an error together with its source chain, e.g.
/// `error sending request for url (...): client error (Connect): connection refused`.
pub fn describe(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
