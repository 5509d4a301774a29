//! Error types for the MCP server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("{0}")]
    Backend(#[from] puch_core::PuchError),

    #[error("Invalid bearer token")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl From<McpError> for String {
    fn from(err: McpError) -> Self {
        err.to_string()
    }
}

/// Result type alias for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_keep_their_message() {
        let e: McpError = puch_core::PuchError::InvalidToken.into();
        assert_eq!(e.to_string(), "Invalid token");
    }

    #[test]
    fn unknown_tool_message_matches_wire_format() {
        let s: String = McpError::UnknownTool("nope".into()).into();
        assert_eq!(s, "Unknown tool: nope");
    }
}
