//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID, target parameter)
//!     → upstream::Forwarder (outbound call to the target origin)
//!     → response.rs (classify, rewrite, add headers)
//!     → Send to client
//! ```

pub mod error;
pub mod landing;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{HandlingPath, OriginPath};
pub use server::HttpServer;
