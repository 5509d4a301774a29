use std::sync::Arc;

use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, GetPromptRequestParams, GetPromptResult, ListPromptsResult,
    ListResourcesResult, PaginatedRequestParams, RawResource, ReadResourceRequestParams,
    ReadResourceResult, ResourceContents,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer};
use rmcp::{prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use puch_core::{Analytics, ContactList, MessagingBackend, SentMessage, TokenRegistry};

pub mod batch;
pub mod error;
pub mod http;
pub mod middleware;
mod prompts;
pub mod telemetry;

pub use error::{McpError, McpResult};

pub const CONTACTS_RESOURCE_URI: &str = "puch://contacts";

#[derive(Clone)]
pub struct PuchMcpHandler {
    backend: Arc<dyn MessagingBackend>,
    tokens: Arc<TokenRegistry>,
    server_name: String,
    tool_router: rmcp::handler::server::tool::ToolRouter<PuchMcpHandler>,
    prompt_router: rmcp::handler::server::router::prompt::PromptRouter<PuchMcpHandler>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ValidateParams {
    /// Puch token to resolve. Omit to use the already authenticated caller.
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SendMessageParams {
    /// Recipient phone number, digits with optional country code
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ContactSearchParams {
    /// Case-insensitive substring of the contact name
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct TimeResult {
    pub current_time: String,
}

// === Prompt Parameters ===

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DraftMessageParams {
    pub contact: String,
    pub intent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct MessagingReportParams {}

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`.
pub fn current_time() -> TimeResult {
    TimeResult {
        current_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

pub(crate) fn record_call(tool: &'static str) {
    metrics::counter!("puch_tool_calls_total", "tool" => tool).increment(1);
}

#[tool_router]
#[prompt_router]
impl PuchMcpHandler {
    pub fn new(
        backend: Arc<dyn MessagingBackend>,
        tokens: TokenRegistry,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            tokens: Arc::new(tokens),
            server_name: server_name.into(),
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_router.list_all().len()
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Resolve a Puch token to the phone number it belongs to.
    pub fn resolve_token(&self, token: Option<&str>) -> McpResult<String> {
        Ok(self.tokens.resolve(token)?)
    }

    pub async fn deliver(&self, phone: &str, message: &str) -> McpResult<SentMessage> {
        Ok(self.backend.send_message(phone, message).await?)
    }

    pub async fn contacts(&self, search: Option<&str>) -> McpResult<ContactList> {
        Ok(self.backend.get_contacts(search).await?)
    }

    pub async fn analytics(&self) -> McpResult<Analytics> {
        Ok(self.backend.get_analytics().await?)
    }

    #[tool(
        name = "validate",
        description = "REQUIRED: Validate token for Puch AI - returns phone number"
    )]
    async fn validate(&self, params: Parameters<ValidateParams>) -> Result<String, String> {
        record_call("validate");
        let phone = self.resolve_token(params.0.token.as_deref())?;
        info!("validate: token resolved");
        Ok(phone)
    }

    #[tool(name = "send_message", description = "Send WhatsApp message")]
    async fn send_message(
        &self,
        params: Parameters<SendMessageParams>,
    ) -> Result<Json<SentMessage>, String> {
        record_call("send_message");
        let p = params.0;
        let receipt = self.deliver(&p.phone, &p.message).await?;
        Ok(Json(receipt))
    }

    #[tool(name = "get_contacts", description = "Get contacts list")]
    async fn get_contacts(
        &self,
        params: Parameters<ContactSearchParams>,
    ) -> Result<Json<ContactList>, String> {
        record_call("get_contacts");
        let list = self.contacts(params.0.search.as_deref()).await?;
        debug!(total = list.total, "get_contacts");
        Ok(Json(list))
    }

    #[tool(name = "get_analytics", description = "Get basic analytics")]
    async fn get_analytics(&self) -> Result<Json<Analytics>, String> {
        record_call("get_analytics");
        Ok(Json(self.analytics().await?))
    }

    #[tool(
        name = "get_time",
        description = "Get the server's current local time"
    )]
    async fn get_time(&self) -> Result<Json<TimeResult>, String> {
        record_call("get_time");
        Ok(Json(current_time()))
    }

    // === Prompts ===

    #[prompt(
        name = "draft-message",
        description = "Look up a contact, draft a message and send it after confirmation"
    )]
    async fn draft_message(&self, params: Parameters<DraftMessageParams>) -> GetPromptResult {
        let intent = params
            .0
            .intent
            .unwrap_or_else(|| "a quick check-in".to_string());
        prompts::draft_message_prompt(&params.0.contact, &intent)
    }

    #[prompt(
        name = "messaging-report",
        description = "Summarize messaging analytics and contacts"
    )]
    async fn messaging_report(&self, _params: Parameters<MessagingReportParams>) -> GetPromptResult {
        prompts::messaging_report_prompt()
    }
}

#[tool_handler]
#[prompt_handler(router = self.prompt_router)]
impl rmcp::ServerHandler for PuchMcpHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        let mut info = rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_resources()
                .build(),
        );
        info.instructions = Some(
            "Puch AI MCP server - call validate first, then use send_message, \
             get_contacts, get_analytics and get_time."
                .into(),
        );
        info.server_info.name = self.server_name.clone();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let mut res = RawResource::new(CONTACTS_RESOURCE_URI, "Contacts").no_annotation();
        res.description = Some("Full contact book with names and phone numbers".to_string());
        res.mime_type = Some("application/json".to_string());

        Ok(ListResourcesResult {
            resources: vec![res],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        if request.uri != CONTACTS_RESOURCE_URI {
            return Err(ErrorData::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ));
        }
        let list = self
            .contacts(None)
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        let text = serde_json::to_string_pretty(&list)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;

        Ok(ReadResourceResult::new(vec![
            ResourceContents::TextResourceContents {
                uri: request.uri.clone(),
                mime_type: Some("application/json".to_string()),
                text,
                meta: None,
            },
        ]))
    }
}
