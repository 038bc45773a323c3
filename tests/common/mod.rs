//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{
    CONTENT_SECURITY_POLICY, CONTENT_TYPE, LOCATION, SET_COOKIE, X_FRAME_OPTIONS,
};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{any, get};
use axum::Router;
use rewrite_proxy::{HttpServer, ProxyConfig, Shutdown};
use tokio::net::TcpListener;
use url::form_urlencoded;

pub const PAGE_HTML: &str = r##"<!DOCTYPE html>
<html><head class="x"><title>Origin</title></head>
<body>
<a href="/about">About</a>
<a href="docs/intro.html">Intro</a>
<a href="javascript:alert(1)">Alert</a>
<a href="#section">Jump</a>
<img src="data:image/png;base64,iVBORw0KGgo=">
<form action="/search"><input name="q"></form>
</body></html>"##;

pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0xff, 0xfe, 0x00, 0x80,
];

/// Request counters kept by the mock origin.
#[derive(Default)]
pub struct Hits {
    pub total: AtomicUsize,
    pub redirect_target: AtomicUsize,
    /// Slow requests whose handler was dropped before replying.
    pub abandoned: AtomicUsize,
}

impl Hits {
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn redirect_target(&self) -> usize {
        self.redirect_target.load(Ordering::SeqCst)
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}

/// A running mock origin.
pub struct Origin {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
}

impl Origin {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a mock origin on an ephemeral port.
pub async fn start_origin() -> Origin {
    let hits = Arc::new(Hits::default());
    let app = Router::new()
        .route("/page", get(page))
        .route("/missing", get(missing))
        .route("/redirect", get(redirect))
        .route("/new", get(redirect_target))
        .route("/image.png", get(image))
        .route("/echo-headers", any(echo_headers))
        .route("/submit", any(submit))
        .route("/slow", get(slow))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Origin { addr, hits }
}

async fn page(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    (
        [
            (CONTENT_TYPE, "text/html; charset=utf-8"),
            (CONTENT_SECURITY_POLICY, "default-src 'self'"),
            (X_FRAME_OPTIONS, "DENY"),
        ],
        AppendHeaders([
            (SET_COOKIE, "session=abc; Domain=127.0.0.1; Path=/"),
            (SET_COOKIE, "theme=dark; Path=/; HttpOnly"),
        ]),
        PAGE_HTML,
    )
}

async fn missing(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/html")],
        "<p>gone</p>",
    )
}

async fn redirect(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::FOUND,
        [(LOCATION, "/new")],
        AppendHeaders([(SET_COOKIE, "flow=1; Domain=example.com; Path=/")]),
        "Redirecting to /new",
    )
}

async fn redirect_target(State(hits): State<Arc<Hits>>) -> &'static str {
    hits.total.fetch_add(1, Ordering::SeqCst);
    hits.redirect_target.fetch_add(1, Ordering::SeqCst);
    "new"
}

async fn image(State(hits): State<Arc<Hits>>) -> impl IntoResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    ([(CONTENT_TYPE, "image/png")], PNG_BYTES.to_vec())
}

/// Replies with one `name: value` line per received header.
async fn echo_headers(State(hits): State<Arc<Hits>>, headers: HeaderMap) -> String {
    hits.total.fetch_add(1, Ordering::SeqCst);
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}\n", name, value.to_str().unwrap_or("<binary>")))
        .collect()
}

async fn submit(State(hits): State<Arc<Hits>>, method: Method, body: Bytes) -> String {
    hits.total.fetch_add(1, Ordering::SeqCst);
    format!("{} {}", method, String::from_utf8_lossy(&body))
}

/// How long `/slow` takes to answer.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(10);

/// Counts the `/slow` handler as abandoned unless it ran to completion.
struct AbandonGuard {
    hits: Arc<Hits>,
    finished: bool,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.hits.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

async fn slow(State(hits): State<Arc<Hits>>) -> &'static str {
    hits.total.fetch_add(1, Ordering::SeqCst);
    let mut guard = AbandonGuard {
        hits,
        finished: false,
    };
    tokio::time::sleep(SLOW_RESPONSE).await;
    guard.finished = true;
    "finally"
}

/// Poll `condition` until it holds or `within` elapses.
pub async fn eventually(within: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(mut config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

pub fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// URL of the proxy endpoint for `target`.
pub fn proxied(proxy: SocketAddr, target: &str) -> String {
    format!("http://{}/proxy?url={}", proxy, encode(target))
}

/// Extract the decoded `url` parameter from a ProxyReference.
pub fn decode_reference(reference: &str) -> Option<String> {
    let (_, query) = reference.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}
