//! HTTP surface: health probe, metrics, the bearer gate, the batch API and the
//! streamable MCP transport mounted at `/mcp`.

use axum::body::Bytes;
use axum::debug_handler;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::tower::{
    StreamableHttpServerConfig, StreamableHttpService,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use puch_core::auth::bearer_token;
use puch_core::observability::HealthReport;

use crate::PuchMcpHandler;
use crate::batch::{self, BatchResponse};

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_BODY_SIZE: usize = 50 * 1024 * 1024;
/// Matches the container health probe timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AppState {
    pub handler: PuchMcpHandler,
    pub metrics: PrometheusHandle,
    pub started: Instant,
}

impl AppState {
    pub fn new(handler: PuchMcpHandler, metrics: PrometheusHandle) -> Self {
        Self {
            handler,
            metrics,
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub max_body_size: usize,
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl HttpOptions {
    /// Read `MAX_HTTP_BODY_SIZE` through `get`; unparsable values keep the default.
    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let max_body_size = get("MAX_HTTP_BODY_SIZE")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BODY_SIZE);
        Self {
            max_body_size,
            ..Self::default()
        }
    }
}

#[debug_handler]
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport::ok(
        state.handler.server_name(),
        state.started,
        state.handler.tool_count(),
    ))
}

#[debug_handler]
async fn root() -> impl IntoResponse {
    Json(json!({ "message": "MCP Server is running!" }))
}

#[debug_handler]
async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.metrics.render();
    ([("content-type", "text/plain; version=0.0.4")], body)
}

#[debug_handler]
async fn tool_calls(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<BatchResponse> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);
    let calls = batch::parse_tool_calls(&body);
    Json(batch::run_batch(&state.handler, bearer, calls).await)
}

async fn require_bearer(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if state.handler.tokens().authorize_header(authorization) {
        return next.run(req).await;
    }
    metrics::counter!("puch_auth_failures_total").increment(1);
    warn!(path = %req.uri().path(), "rejected request without a valid bearer token");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "error": "Invalid bearer token" })),
    )
        .into_response()
}

/// Build the full application router.
pub fn router(state: Arc<AppState>, opts: &HttpOptions) -> Router {
    let handler = state.handler.clone();
    let factory = move || -> Result<_, std::io::Error> { Ok(handler.clone()) };
    let session = Arc::new(LocalSessionManager::default());
    let mcp_service = StreamableHttpService::new(
        factory,
        session,
        StreamableHttpServerConfig::default(),
    );

    // route_layer keeps unmatched paths on the 404 fallback instead of the gate.
    let gated = Router::new()
        .route("/tool-calls", post(tool_calls))
        .nest_service("/mcp", mcp_service)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/", get(root))
        .route("/metrics", get(metrics_endpoint))
        .merge(gated)
        // DefaultBodyLimit only binds axum extractors; the MCP service reads its body itself.
        .layer(DefaultBodyLimit::max(opts.max_body_size))
        .layer(RequestBodyLimitLayer::new(opts.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            opts.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl-C or, on unix, SIGTERM (what `docker stop` sends).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install ctrl+c handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_options_from_env() {
        let o = HttpOptions::from_env_with(|_| None);
        assert_eq!(o.max_body_size, DEFAULT_MAX_BODY_SIZE);
        assert_eq!(o.request_timeout, Duration::from_secs(10));
        let o = HttpOptions::from_env_with(|k| (k == "MAX_HTTP_BODY_SIZE").then(|| "1024".into()));
        assert_eq!(o.max_body_size, 1024);
        let o = HttpOptions::from_env_with(|k| (k == "MAX_HTTP_BODY_SIZE").then(|| "lots".into()));
        assert_eq!(o.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }
}
