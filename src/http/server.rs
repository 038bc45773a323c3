//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Run the proxied exchange: target extraction, forwarding, dispatch
//! - Observability (metrics, correlation IDs)

use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::ProxyConfig;
use crate::http::error::ProxyError;
use crate::http::landing::landing_page;
use crate::http::request::{target_param, MakeRequestUuidV4, RequestIdExt};
use crate::http::response::{self, HandlingPath, OriginPath};
use crate::observability::metrics;
use crate::rewrite::{parse_target, RewriteContext};
use crate::upstream::{Forwarder, OutboundRequest, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    /// Route the proxy endpoint is mounted on.
    pub proxy_path: String,
    /// Endpoint prefix written into ProxyReferences.
    pub endpoint: String,
    pub inject_base: bool,
    pub max_request_body_bytes: usize,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        let forwarder = Forwarder::new(&config.upstream, &config.timeouts)?;

        let state = AppState {
            forwarder,
            proxy_path: config.rewrite.proxy_path.clone(),
            endpoint: config.rewrite.endpoint(),
            inject_base: config.rewrite.inject_base,
            max_request_body_bytes: config.upstream.max_request_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(landing_page))
            .route(&config.rewrite.proxy_path, any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request.headers().request_id(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_path = %self.config.rewrite.proxy_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Proxy endpoint handler.
/// Answers preflights locally, otherwise forwards to the target and rewrites the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.headers().request_id().to_string();
    let method = request.method().clone();

    match proxy_exchange(&state, request, &request_id).await {
        Ok((path, response)) => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                handling = %path,
                status = response.status().as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Request proxied"
            );
            metrics::record_request(method.as_str(), response.status().as_u16(), path.as_str(), start_time);
            response
        }
        Err(e) => {
            match &e {
                ProxyError::MissingTarget | ProxyError::InvalidTarget(_) => {
                    tracing::debug!(request_id = %request_id, error = %e, "Rejected request");
                }
                _ => tracing::warn!(request_id = %request_id, error = %e, "Upstream failure"),
            }
            let response = e.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), "error", start_time);
            response
        }
    }
}

async fn proxy_exchange(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
) -> Result<(HandlingPath, Response), ProxyError> {
    if request.method() == Method::OPTIONS {
        return Ok((HandlingPath::Preflight, response::preflight()));
    }

    let raw_target = target_param(request.uri().query()).ok_or(ProxyError::MissingTarget)?;
    let target = parse_target(&raw_target).map_err(ProxyError::InvalidTarget)?;
    let ctx = RewriteContext::new(target, state.endpoint.as_str());

    let (parts, body) = request.into_parts();
    let body = read_inbound_body(body, state.max_request_body_bytes, request_id).await;
    let outbound = state
        .forwarder
        .build(&parts.method, &parts.headers, body, ctx.target());

    tracing::debug!(request_id, method = %parts.method, target_url = %ctx.target(), "Forwarding to origin");

    let mut in_flight = InFlight::new(request_id, ctx.target());
    let fetched = fetch_origin(&state.forwarder, outbound).await;
    in_flight.complete();
    let (status, headers, path, body) = fetched?;

    Ok((
        path.into(),
        response::dispatch(path, &ctx, state.inject_base, status, headers, body),
    ))
}

/// Send the outbound request and read as much of the response as its
/// handling path needs.
async fn fetch_origin(
    forwarder: &Forwarder,
    outbound: OutboundRequest,
) -> Result<(StatusCode, HeaderMap, OriginPath, Bytes), ProxyError> {
    let mut upstream = forwarder.send(outbound).await?;

    let status = upstream.status();
    let headers = std::mem::take(upstream.headers_mut());
    let path = OriginPath::classify(status, &headers);
    let body = if path.needs_body() {
        upstream.bytes().await.map_err(ProxyError::UpstreamBody)?
    } else {
        Bytes::new()
    };
    Ok((status, headers, path, body))
}

/// Buffer the client body; a failed read forwards an empty body instead.
async fn read_inbound_body(body: Body, limit: usize, request_id: &str) -> Bytes {
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id, error = %e, "Failed to read request body, forwarding empty body");
            Bytes::new()
        }
    }
}

/// Logs when the client disconnects while the origin call is outstanding.
///
/// hyper drops the handler future on disconnect, which drops (and aborts)
/// the outbound reqwest call along with this guard.
struct InFlight<'a> {
    request_id: &'a str,
    target: &'a Url,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(request_id: &'a str, target: &'a Url) -> Self {
        Self {
            request_id,
            target,
            done: false,
        }
    }

    fn complete(&mut self) {
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(
                request_id = self.request_id,
                target_url = %self.target,
                "Origin call abandoned before completion"
            );
        }
    }
}
