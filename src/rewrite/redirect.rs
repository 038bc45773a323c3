//! Location header rewriting for redirect responses.

use crate::rewrite::RewriteContext;

/// Route a `Location` value back through the proxy.
///
/// Location values are always navigable, so no scheme is exempt. A value
/// that cannot be resolved is returned unchanged.
pub fn rewrite_location(location: &str, ctx: &RewriteContext) -> String {
    match ctx.route(location) {
        Ok(reference) => reference,
        Err(e) => {
            tracing::debug!(location, error = %e, "Unresolvable Location left as-is");
            location.to_string()
        }
    }
}
