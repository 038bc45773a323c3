//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (drop Sec-*/Origin/Referer/Host, fix User-Agent)
//!     → forwarded to origin
//!
//! Origin response:
//!     → headers.rs (strip hop-by-hop, CSP, frame options; add CORS)
//!     → sent to client
//! ```
//!
//! # Design Decisions
//! - No client page identity reaches the origin
//! - No origin policy header stops the page from loading through the proxy
//! - Any origin may be targeted; there is no allow-list

pub mod headers;
