//! Reference resolution and proxy link construction.

use url::form_urlencoded;
use url::{ParseError, Url};

/// Resolve a possibly-relative reference against `base`.
///
/// Scheme-relative references (`//host/path`) are promoted to `https:`
/// regardless of the base scheme. Absolute references resolve to themselves.
pub fn resolve(reference: &str, base: &Url) -> Result<Url, ParseError> {
    match reference.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => base.join(reference),
    }
}

/// Parse a client-supplied target, requiring a scheme and an authority.
pub fn parse_target(raw: &str) -> Result<Url, ParseError> {
    let url = Url::parse(raw)?;
    if !url.has_host() {
        return Err(ParseError::EmptyHost);
    }
    Ok(url)
}

/// Per-request rewriting inputs: the target being proxied and the proxy's
/// own endpoint.
///
/// Built fresh for every request and never shared.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    target: Url,
    endpoint: String,
}

impl RewriteContext {
    /// `endpoint` is the proxy path as clients see it, e.g. `/proxy` or
    /// `https://proxy.example/proxy`.
    pub fn new(target: Url, endpoint: impl Into<String>) -> Self {
        Self {
            target,
            endpoint: endpoint.into(),
        }
    }

    /// The absolute URL being proxied.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Build a ProxyReference routing `url` back through the proxy.
    pub fn proxy_reference(&self, url: &Url) -> String {
        let encoded: String = form_urlencoded::byte_serialize(url.as_str().as_bytes()).collect();
        format!("{}?url={}", self.endpoint, encoded)
    }

    /// Resolve `reference` against the target and wrap it as a ProxyReference.
    pub fn route(&self, reference: &str) -> Result<String, ParseError> {
        resolve(reference, &self.target).map(|url| self.proxy_reference(&url))
    }
}

#[cfg(test)]
pub(crate) fn decode_reference(reference: &str) -> Option<String> {
    let (_, query) = reference.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/page.html?q=1").unwrap()
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("other.html", &base()).unwrap().as_str(),
            "https://example.com/docs/other.html"
        );
        assert_eq!(
            resolve("/about", &base()).unwrap().as_str(),
            "https://example.com/about"
        );
        assert_eq!(
            resolve("../up", &base()).unwrap().as_str(),
            "https://example.com/up"
        );
        assert_eq!(
            resolve("?page=2", &base()).unwrap().as_str(),
            "https://example.com/docs/page.html?page=2"
        );
    }

    #[test]
    fn test_resolve_absolute_passes_through() {
        assert_eq!(
            resolve("http://other.org/x?y=z", &base()).unwrap().as_str(),
            "http://other.org/x?y=z"
        );
    }

    #[test]
    fn test_resolve_scheme_relative_promotes_https() {
        let http_base = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            resolve("//cdn.example.net/app.js", &http_base).unwrap().as_str(),
            "https://cdn.example.net/app.js"
        );
    }

    #[test]
    fn test_resolve_failure() {
        assert!(resolve("http://[::1", &base()).is_err());
        assert!(resolve("//", &base()).is_err());
    }

    #[test]
    fn test_parse_target() {
        assert!(parse_target("https://example.com").is_ok());
        assert!(parse_target("not a url").is_err());
        assert!(parse_target("/relative/path").is_err());
        assert!(parse_target("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_proxy_reference_encoding() {
        let ctx = RewriteContext::new(base(), "/proxy");
        let url = Url::parse("https://example.com/about").unwrap();
        assert_eq!(
            ctx.proxy_reference(&url),
            "/proxy?url=https%3A%2F%2Fexample.com%2Fabout"
        );
    }

    #[test]
    fn test_route_round_trips_through_query() {
        let ctx = RewriteContext::new(base(), "https://proxy.example/proxy");
        let routed = ctx.route("search?q=a b&lang=en").unwrap();
        assert!(routed.starts_with("https://proxy.example/proxy?url="));
        assert_eq!(
            decode_reference(&routed).as_deref(),
            Some("https://example.com/docs/search?q=a%20b&lang=en")
        );
    }
}
