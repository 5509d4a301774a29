use serde::Serialize;
use std::time::Instant;

/// Liveness payload served on `/health`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: String,
    pub uptime_secs: u64,
    pub tools: usize,
}

impl HealthReport {
    pub fn ok(service: impl Into<String>, started: Instant, tools: usize) -> Self {
        Self {
            status: "ok",
            service: service.into(),
            uptime_secs: started.elapsed().as_secs(),
            tools,
        }
    }
}
