use std::sync::Arc;

use puch_core::{Config, InMemoryBackend, MessagingBackend};
use puch_mcp::PuchMcpHandler;
use puch_mcp::middleware::LoggingBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_env = puch_mcp::telemetry::log_env();
    puch_mcp::telemetry::init(&log_env);
    tracing::info!("puch_mcp: log filter: {}", log_env);

    let config = Config::from_env()?;
    let backend: Arc<dyn MessagingBackend> =
        Arc::new(LoggingBackend::new(InMemoryBackend::default()));
    let handler = PuchMcpHandler::new(backend, config.token_registry(), config.server_name);

    tracing::info!(
        "puch_mcp: registered {} tools and {} prompts",
        handler.tool_count(),
        handler.prompt_count()
    );

    // stdio has no HTTP bearer gate; the process owner is the caller.
    tracing::info!("puch_mcp: starting stdio MCP server...");

    use rmcp::serve_server;
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = serve_server(handler, transport).await?;

    tracing::info!("puch_mcp: service initialized as server");

    server.waiting().await?;

    Ok(())
}
