//! Rewriting forward proxy library.
//!
//! Relays a request to any origin named in the `url` query parameter and
//! rewrites the response (links, redirects, cookies) so that navigation
//! keeps going through the proxy.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
