//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Generic desktop-browser identity presented to every origin.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Root configuration for the rewriting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound request settings.
    pub upstream: UpstreamConfig,

    /// Link and redirect rewriting settings.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total budget for one inbound request in seconds.
    /// Must exceed `upstream_secs` so origin timeouts surface as 502s.
    pub request_secs: u64,

    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Outbound request timeout (send + body read) in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            connect_secs: 10,
            upstream_secs: 30,
        }
    }
}

/// Outbound request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// User-Agent sent to every origin, replacing the client's.
    pub user_agent: String,

    /// Largest inbound body buffered for forwarding.
    pub max_request_body_bytes: usize,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for outbound calls.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_request_body_bytes: 10 * 1024 * 1024,
            system_proxy: false,
        }
    }
}

/// Rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Path of the proxy endpoint that rewritten links point at.
    pub proxy_path: String,

    /// Absolute origin of the proxy as seen by clients (e.g., "https://proxy.example").
    /// When unset, rewritten links are origin-relative.
    pub public_origin: Option<String>,

    /// Insert a `<base>` element pointing at the target into HTML documents.
    pub inject_base: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            proxy_path: "/proxy".to_string(),
            public_origin: None,
            inject_base: true,
        }
    }
}

impl RewriteConfig {
    /// The externally visible endpoint prefix used in ProxyReferences.
    pub fn endpoint(&self) -> String {
        match &self.public_origin {
            Some(origin) => format!("{}{}", origin.trim_end_matches('/'), self.proxy_path),
            None => self.proxy_path.clone(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
