//! In-document link rewriting.
//!
//! # Responsibilities
//! - Route every `href`, `src` and `action` attribute through the proxy
//! - Leave non-navigable values (`javascript:`, `data:`, `mailto:`, `#frag`) alone
//! - Insert a `<base>` marker right after the opening `<head>` tag
//!
//! # Design Decisions
//! - Uses a streaming HTML tokenizer (lol_html) rather than a regex, so
//!   script/style text and comments are never mistaken for attributes
//! - Only matched attribute values change; all other bytes pass through
//! - Fails open: an unresolvable value, or a tokenizer error, keeps the original

use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Settings};
use url::Url;

use crate::rewrite::RewriteContext;

/// Attributes whose values are rewritten.
pub const LINK_ATTRIBUTES: [&str; 3] = ["href", "src", "action"];

const EXEMPT_PREFIXES: [&str; 4] = ["javascript:", "data:", "mailto:", "#"];

/// Rewrite all link-bearing attributes in `html`.
///
/// With `inject_base` set, a `<base href>` pointing at the target is placed
/// immediately after the first opening `<head>` tag.
pub fn rewrite_html(html: &str, ctx: &RewriteContext, inject_base: bool) -> String {
    match try_rewrite(html, ctx, inject_base) {
        Ok(rewritten) => rewritten,
        Err(e) => {
            tracing::warn!(target_url = %ctx.target(), error = %e, "HTML rewrite failed, serving original document");
            html.to_string()
        }
    }
}

fn try_rewrite(html: &str, ctx: &RewriteContext, inject_base: bool) -> Result<String, RewritingError> {
    let marker = base_marker(ctx.target());
    let mut pending_base = inject_base;
    let mut output = Vec::with_capacity(html.len() + marker.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("head", |el| {
                    if pending_base {
                        el.prepend(&marker, ContentType::Html);
                        pending_base = false;
                    }
                    Ok(())
                }),
                element!("*", |el| {
                    for name in LINK_ATTRIBUTES {
                        let Some(value) = el.get_attribute(name) else {
                            continue;
                        };
                        if let Some(rewritten) = rewrite_link(&value, ctx) {
                            el.set_attribute(name, &rewritten)?;
                        }
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Compute the replacement for one attribute value, or `None` to keep it.
pub fn rewrite_link(value: &str, ctx: &RewriteContext) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || is_exempt(value) {
        return None;
    }

    // lol_html hands back the raw attribute text, character references included.
    let value = html_escape::decode_html_entities(value);
    match ctx.route(&value) {
        Ok(reference) => Some(reference),
        Err(e) => {
            tracing::debug!(value = %value, error = %e, "Unresolvable link left as-is");
            None
        }
    }
}

fn is_exempt(value: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| {
        value
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

fn base_marker(target: &Url) -> String {
    format!(r#"<base href="{}">"#, escape_attribute(target.as_str()))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
