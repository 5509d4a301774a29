/// Filter used when the configured one does not parse.
pub const FALLBACK_FILTER: &str = "info,rmcp=warn";

/// Log level from `PUCH_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn log_env() -> String {
    log_env_with(|k| std::env::var(k).ok())
}

pub fn log_env_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("PUCH_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// Append per-target overrides to keep rmcp internals quiet by default.
pub fn combined_filter(log_env: &str) -> String {
    format!("{},rmcp=warn", log_env)
}

pub fn env_filter(log_env: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_new(combined_filter(log_env))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber. Logs go to stderr so stdio transport stays clean.
pub fn init(log_env: &str) {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(log_env))
        .init();
}
