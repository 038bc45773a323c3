//! Response rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! origin response
//!     → redirect.rs (Location → ProxyReference)
//!     → cookie.rs   (Set-Cookie: drop Domain)
//!     → charset.rs  (declared charset → UTF-8 text)
//!     → html.rs     (href/src/action → ProxyReference, <base> marker)
//!
//! all three resolve references through reference.rs against the RewriteContext
//! ```
//!
//! # Design Decisions
//! - Pure functions over text and header maps; no I/O
//! - Every transform fails open and keeps the original value
//! - RewriteContext is built per request and never cached

pub mod charset;
pub mod cookie;
pub mod html;
pub mod redirect;
pub mod reference;

pub use charset::{decode_document, utf8_content_type};
pub use cookie::{rewrite_set_cookies, strip_domain};
pub use html::rewrite_html;
pub use redirect::rewrite_location;
pub use reference::{parse_target, resolve, RewriteContext};
