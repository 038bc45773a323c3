//! Set-Cookie scope rewriting.
//!
//! Cookies set by an origin are scoped to the origin's domain, which the
//! browser never talks to while proxied. Dropping the `Domain` attribute
//! makes the cookie host-only for the proxy instead.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

/// Remove every `Domain` attribute from one Set-Cookie value.
///
/// The `name=value` pair and all other attributes are kept byte-for-byte,
/// in their original order.
pub fn strip_domain(set_cookie: &str) -> String {
    let mut segments = set_cookie.split(';');
    let mut out = String::with_capacity(set_cookie.len());

    if let Some(pair) = segments.next() {
        out.push_str(pair);
    }
    for attribute in segments {
        if is_domain_attribute(attribute) {
            continue;
        }
        out.push(';');
        out.push_str(attribute);
    }
    out
}

fn is_domain_attribute(attribute: &str) -> bool {
    let name = attribute.split('=').next().unwrap_or_default();
    name.trim().eq_ignore_ascii_case("domain")
}

/// Rewrite every Set-Cookie header in place, keeping one header per cookie.
pub fn rewrite_set_cookies(headers: &mut HeaderMap) {
    let values: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    if values.is_empty() {
        return;
    }

    headers.remove(SET_COOKIE);
    for value in values {
        let rewritten = match value.to_str() {
            Ok(text) => HeaderValue::from_str(&strip_domain(text)).unwrap_or(value),
            // Opaque bytes are forwarded as received.
            Err(_) => value,
        };
        headers.append(SET_COOKIE, rewritten);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_domain() {
        assert_eq!(
            strip_domain("session=abc; Domain=example.com; Path=/"),
            "session=abc; Path=/"
        );
    }

    #[test]
    fn test_strip_domain_case_insensitive() {
        assert_eq!(
            strip_domain("id=1; path=/; DOMAIN=.example.com; Secure; HttpOnly"),
            "id=1; path=/; Secure; HttpOnly"
        );
        assert_eq!(strip_domain("id=1;domain = example.com"), "id=1");
    }

    #[test]
    fn test_preserves_other_attributes_verbatim() {
        let input = "pref=dark;  Max-Age=3600; Expires=Wed, 21 Oct 2026 07:28:00 GMT; SameSite=Lax";
        assert_eq!(strip_domain(input), input);
    }

    #[test]
    fn test_cookie_named_domain_is_kept() {
        assert_eq!(
            strip_domain("domain=value; Domain=example.com"),
            "domain=value"
        );
    }

    #[test]
    fn test_rewritten_value_never_has_domain() {
        let inputs = [
            "a=1; Domain=x.com",
            "b=2; Path=/; domain=x.com; Domain=y.com",
            "c=3; DoMaIn=z.org; Secure",
        ];
        for input in inputs {
            let out = strip_domain(input).to_ascii_lowercase();
            assert!(!out.contains("domain="), "{out}");
        }
    }

    #[test]
    fn test_rewrite_keeps_multiplicity() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Domain=example.com; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2; Secure"));

        rewrite_set_cookies(&mut headers);

        let values: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["a=1; Path=/", "b=2; Secure"]);
    }
}
