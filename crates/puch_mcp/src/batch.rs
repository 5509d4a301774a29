//! JSON tool-call batch API served on `POST /tool-calls`.
//!
//! Request: `{"tool_calls": [{"tool_name": "...", "tool_input": {...}}]}`.
//! Response: `{"tool_outputs": [{"tool_name": "...", "tool_output": {...}}]}`, one
//! output per call in request order. A failing call yields `{"error": "..."}` as
//! its output and never fails the batch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::{
    ContactSearchParams, McpError, McpResult, PuchMcpHandler, SendMessageParams, current_time,
    record_call,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub tool_input: Value,
}

impl ToolCall {
    fn from_value(v: &Value) -> Self {
        Self {
            tool_name: v
                .get("tool_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            tool_input: v.get("tool_input").cloned().unwrap_or_else(|| json!({})),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_name: String,
    pub tool_output: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub tool_outputs: Vec<ToolOutput>,
}

/// Extract tool calls from a raw body. Anything that is not a JSON object
/// with a `tool_calls` array yields no calls.
pub fn parse_tool_calls(body: &[u8]) -> Vec<ToolCall> {
    let Ok(Value::Object(root)) = serde_json::from_slice::<Value>(body) else {
        return Vec::new();
    };
    match root.get("tool_calls") {
        Some(Value::Array(calls)) => calls.iter().map(ToolCall::from_value).collect(),
        _ => Vec::new(),
    }
}

/// Run every call in order against the handler.
pub async fn run_batch(
    handler: &PuchMcpHandler,
    bearer: Option<&str>,
    calls: Vec<ToolCall>,
) -> BatchResponse {
    let span = info_span!("tool_batch", batch_id = %Uuid::new_v4(), calls = calls.len());
    async move {
        let mut tool_outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let tool_output = match dispatch(handler, bearer, &call).await {
                Ok(v) => v,
                Err(e) => {
                    debug!(tool = %call.tool_name, error = %e, "tool call failed");
                    json!({ "error": e.to_string() })
                }
            };
            tool_outputs.push(ToolOutput {
                tool_name: call.tool_name,
                tool_output,
            });
        }
        BatchResponse { tool_outputs }
    }
    .instrument(span)
    .await
}

async fn dispatch(
    handler: &PuchMcpHandler,
    bearer: Option<&str>,
    call: &ToolCall,
) -> McpResult<Value> {
    match call.tool_name.as_str() {
        "validate" => {
            record_call("validate");
            let token = bearer.ok_or(McpError::Unauthorized)?;
            let phone = handler
                .resolve_token(Some(token))
                .map_err(|_| McpError::Unauthorized)?;
            Ok(json!({ "user_id": phone }))
        }
        "get_time" => {
            record_call("get_time");
            Ok(serde_json::to_value(current_time())?)
        }
        "send_message" => {
            record_call("send_message");
            let p: SendMessageParams = input(&call.tool_input)?;
            Ok(serde_json::to_value(handler.deliver(&p.phone, &p.message).await?)?)
        }
        "get_contacts" => {
            record_call("get_contacts");
            let p: ContactSearchParams = input(&call.tool_input)?;
            Ok(serde_json::to_value(handler.contacts(p.search.as_deref()).await?)?)
        }
        "get_analytics" => {
            record_call("get_analytics");
            Ok(serde_json::to_value(handler.analytics().await?)?)
        }
        other => Err(McpError::UnknownTool(other.to_string())),
    }
}

fn input<T: DeserializeOwned>(v: &Value) -> McpResult<T> {
    let v = if v.is_null() { json!({}) } else { v.clone() };
    serde_json::from_value(v).map_err(|e| McpError::InvalidInput(e.to_string()))
}
