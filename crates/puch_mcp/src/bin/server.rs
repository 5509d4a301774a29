use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use tracing::info;

use puch_core::{Config, InMemoryBackend, MessagingBackend};
use puch_mcp::PuchMcpHandler;
use puch_mcp::http::{self, AppState, HttpOptions};
use puch_mcp::middleware::LoggingBackend;

/// Parse `ADDRESS`, falling back to [`http::DEFAULT_ADDRESS`] when unset or unparsable.
fn listen_addr(raw: Option<String>) -> Result<SocketAddr, AddrParseError> {
    match raw.as_deref().map(str::parse::<SocketAddr>) {
        Some(Ok(addr)) => Ok(addr),
        _ => http::DEFAULT_ADDRESS.parse(),
    }
}


#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let log_env = puch_mcp::telemetry::log_env();
    puch_mcp::telemetry::init(&log_env);
    tracing::info!(%log_env, "puch_mcp:http: log filter");

    let handle = PrometheusBuilder::new().install_recorder()?;

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(%e, "invalid configuration; aborting startup");
            std::process::exit(1);
        }
    };
    if config.auth_token.is_none() {
        tracing::warn!("PUCH_AUTH_TOKEN is not set; /mcp and /tool-calls accept any caller");
    }

    let backend: Arc<dyn MessagingBackend> =
        Arc::new(LoggingBackend::new(InMemoryBackend::default()));
    let handler = PuchMcpHandler::new(backend, config.token_registry(), config.server_name.clone());
    info!(
        tools = handler.tool_count(),
        prompts = handler.prompt_count(),
        "registered MCP handler"
    );

    let opts = HttpOptions::from_env_with(|k| std::env::var(k).ok());
    let state = Arc::new(AppState::new(handler, handle));
    let app = http::router(state, &opts);

    let addr = listen_addr(std::env::var("ADDRESS").ok())?;
    info!(%addr, max_body_bytes = opts.max_body_size, "starting HTTP server");
    info!("MCP endpoint: http://localhost:{}/mcp/", addr.port());
    info!("connect from Puch with: /mcp connect https://<your-tunnel>/mcp/ <token>");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service());
    if let Err(e) = server.with_graceful_shutdown(http::shutdown_signal()).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
    info!("server stopped");

    Ok(())
}
