//! MCP server implementation.
//!
//! Handles protocol lifecycle and dispatches tool and prompt requests
//! against the shared [`GenieService`].
//!
//! [`GenieService`]: genie_core::GenieService

use std::sync::Arc;

use genie_core::GenieService;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{McpError, McpResult};
use crate::protocol::{
    InitializeParams, InitializeResult, PromptsCapability, PromptsGetParams, PromptsGetResult,
    PromptsListResult, ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult,
    ToolContent, ToolsCapability, ToolsListResult, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::{prompts, tools};

/// MCP server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server created but not initialized
    Uninitialized,
    /// Server initialized and ready to handle requests
    Ready,
}

/// MCP server. Everything runs against one shared service instance so all
/// requests see the same rate limiter and conversation tracker.
pub struct McpServer {
    state: Arc<Mutex<ServerState>>,
    service: Arc<GenieService>,
}

impl McpServer {
    pub fn new(service: Arc<GenieService>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState::Uninitialized)),
            service,
        }
    }

    /// Get current server state
    pub async fn state(&self) -> ServerState {
        *self.state.lock().await
    }

    /// Check if server is ready
    pub async fn is_ready(&self) -> bool {
        self.state().await == ServerState::Ready
    }

    async fn set_state(&self, new_state: ServerState) {
        *self.state.lock().await = new_state;
    }

    /// Handle MCP initialize request.
    ///
    /// Negotiates the protocol version: a supported requested version is
    /// echoed back, anything else is rejected.
    pub async fn handle_initialize(&self, params: InitializeParams) -> McpResult<InitializeResult> {
        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&params.protocol_version.as_str()) {
            return Err(McpError::UnsupportedProtocol(params.protocol_version));
        }

        self.set_state(ServerState::Ready).await;
        info!(
            target: "mcp_server",
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol = %params.protocol_version,
            "initialized"
        );

        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
            prompts: Some(PromptsCapability {
                list_changed: Some(false),
            }),
        };

        let server_info = ServerInfo {
            name: "genie-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        Ok(InitializeResult {
            protocol_version: params.protocol_version,
            capabilities,
            server_info,
        })
    }

    /// Handle ping request. Allowed in any state.
    pub async fn handle_ping(&self) -> McpResult<Value> {
        Ok(json!({}))
    }

    /// Handle tools/list request.
    pub async fn handle_tools_list(&self) -> McpResult<ToolsListResult> {
        if !self.is_ready().await {
            return Err(McpError::NotInitialized);
        }

        debug!(target: "mcp_server", "listing available tools");
        Ok(ToolsListResult {
            tools: tools::definitions(),
        })
    }

    /// Handle tools/call request.
    ///
    /// Backend failures come back as an in-band result with `isError` set,
    /// so the caller sees what went wrong; protocol-level mistakes (unknown
    /// tool, malformed arguments) stay JSON-RPC errors.
    pub async fn handle_tools_call(&self, params: ToolCallParams) -> McpResult<ToolCallResult> {
        if !self.is_ready().await {
            return Err(McpError::NotInitialized);
        }

        debug!(target: "mcp_server", tool = %params.name, "calling tool");

        let result = match self.dispatch_tool(&params.name, params.arguments).await {
            Ok(value) => value,
            Err(McpError::Genie(err)) => {
                warn!(target: "mcp_server", tool = %params.name, error = %err, "tool failed");
                return Ok(ToolCallResult {
                    content: vec![ToolContent::Text {
                        text: err.to_string(),
                    }],
                    is_error: Some(true),
                });
            }
            Err(other) => return Err(other),
        };

        Ok(ToolCallResult {
            content: vec![ToolContent::Text {
                text: serde_json::to_string_pretty(&result)?,
            }],
            is_error: Some(false),
        })
    }

    async fn dispatch_tool(&self, name: &str, arguments: Option<Value>) -> McpResult<Value> {
        let service = self.service.as_ref();
        match name {
            "create_genie_space" => tools::create_genie_space(service, arguments).await,
            "list_genie_spaces" => tools::list_genie_spaces(service, arguments).await,
            "get_genie_space" => tools::get_genie_space(service, arguments).await,
            "update_genie_space" => tools::update_genie_space(service, arguments).await,
            "delete_genie_space" => tools::delete_genie_space(service, arguments).await,
            "ask_genie" => tools::ask_genie(service, arguments).await,
            "continue_conversation" => tools::continue_conversation(service, arguments).await,
            "get_query_results" => tools::get_query_results(service, arguments).await,
            "list_conversations" => tools::list_conversations(service, arguments).await,
            "get_conversation_history" => tools::get_conversation_history(service, arguments).await,
            "get_config_schema" => tools::get_config_schema(service, arguments).await,
            "get_config_template" => tools::get_config_template(service, arguments).await,
            "validate_space_config" => tools::validate_space_config(service, arguments).await,
            "extract_table_metadata" => tools::extract_table_metadata(service, arguments).await,
            "get_rate_limit_status" => tools::get_rate_limit_status(service, arguments).await,
            _ => Err(McpError::MethodNotFound(format!("Unknown tool: {name}"))),
        }
    }

    /// Handle prompts/list request.
    pub async fn handle_prompts_list(&self) -> McpResult<PromptsListResult> {
        if !self.is_ready().await {
            return Err(McpError::NotInitialized);
        }

        debug!(target: "mcp_server", "listing available prompts");
        Ok(PromptsListResult {
            prompts: prompts::list_prompts(),
        })
    }

    /// Handle prompts/get request. Runs the skill and returns its rendered
    /// markdown.
    pub async fn handle_prompts_get(&self, params: PromptsGetParams) -> McpResult<PromptsGetResult> {
        if !self.is_ready().await {
            return Err(McpError::NotInitialized);
        }

        debug!(target: "mcp_server", prompt = %params.name, "rendering prompt");

        match prompts::get_prompt(self.service.as_ref(), &params.name, params.arguments).await? {
            Some(result) => Ok(result),
            None => Err(McpError::InvalidParams(format!(
                "Unknown prompt: {}",
                params.name
            ))),
        }
    }
}
