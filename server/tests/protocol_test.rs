//! Protocol-level tests for the MCP server: lifecycle gating, version
//! negotiation, tool dispatch, and the in-band error contract, all against
//! a stub backend.

use std::sync::Arc;

use async_trait::async_trait;
use genie_core::client::{GenieApi, SpaceCreate, SpaceUpdate};
use genie_core::model::{
    ConversationList, GenieMessage, MessageHandle, QueryResult, Space, SpaceList, SpaceSummary,
    TableMetadata, Warehouse,
};
use genie_core::{GenieConfig, GenieError, GenieService, Result};
use genie_mcp_server::protocol::{
    InitializeParams, PromptsGetParams, ToolCallParams, ToolContent,
};
use genie_mcp_server::McpServer;
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config() -> GenieConfig {
    GenieConfig {
        host: "https://unit.test.databricks.com".to_string(),
        token: Some("dapi-test".to_string()),
        request_timeout_seconds: 10,
        timeout_seconds: 300,
        poll_interval_seconds: 2,
        max_retries: 0,
        rate_limit_max_requests: 5,
        rate_limit_window_seconds: 60,
    }
}

fn summary(space_id: &str, title: &str) -> SpaceSummary {
    SpaceSummary {
        space_id: space_id.to_string(),
        title: title.to_string(),
        description: None,
        warehouse_id: None,
    }
}

fn server_with(spaces: Vec<SpaceSummary>) -> McpServer {
    let api = Arc::new(StubApi { spaces });
    McpServer::new(Arc::new(GenieService::new(api, test_config())))
}

async fn initialized(spaces: Vec<SpaceSummary>) -> McpServer {
    let server = server_with(spaces);
    server
        .handle_initialize(init_params("2025-06-18"))
        .await
        .unwrap();
    server
}

/// Build initialize params from wire JSON so the camelCase field names are
/// exercised too.
fn init_params(version: &str) -> InitializeParams {
    serde_json::from_value(json!({
        "protocolVersion": version,
        "capabilities": {},
        "clientInfo": {"name": "test-client", "version": "0.1.0"}
    }))
    .unwrap()
}

fn call(name: &str, arguments: Value) -> ToolCallParams {
    serde_json::from_value(json!({"name": name, "arguments": arguments})).unwrap()
}

fn prompt(name: &str, arguments: Value) -> PromptsGetParams {
    serde_json::from_value(json!({"name": name, "arguments": arguments})).unwrap()
}

fn text_of(content: &ToolContent) -> &str {
    match content {
        ToolContent::Text { text } => text,
        other => panic!("expected text content, got {other:?}"),
    }
}

// ============================================================================
// Stub backend
// ============================================================================

/// A [`GenieApi`] double that serves a fixed space listing and fails space
/// fetches with a not-found error. Everything else fails loudly so a test
/// cannot wander off-script unnoticed.
struct StubApi {
    spaces: Vec<SpaceSummary>,
}

impl StubApi {
    fn off_script<T>(&self, what: &str) -> Result<T> {
        Err(GenieError::Api(format!("{what} is not scripted")))
    }
}

#[async_trait]
impl GenieApi for StubApi {
    async fn start_conversation(&self, _space_id: &str, _question: &str) -> Result<MessageHandle> {
        self.off_script("start_conversation")
    }

    async fn create_message(
        &self,
        _space_id: &str,
        _conversation_id: &str,
        _question: &str,
    ) -> Result<MessageHandle> {
        self.off_script("create_message")
    }

    async fn get_message(
        &self,
        _space_id: &str,
        _conversation_id: &str,
        _message_id: &str,
    ) -> Result<GenieMessage> {
        self.off_script("get_message")
    }

    async fn get_query_result(
        &self,
        _space_id: &str,
        _conversation_id: &str,
        _message_id: &str,
        _attachment_id: Option<String>,
    ) -> Result<QueryResult> {
        self.off_script("get_query_result")
    }

    async fn create_space(&self, _request: SpaceCreate) -> Result<Space> {
        self.off_script("create_space")
    }

    async fn update_space(&self, _space_id: &str, _request: SpaceUpdate) -> Result<Space> {
        self.off_script("update_space")
    }

    async fn get_space(&self, space_id: &str, _include_serialized: bool) -> Result<Space> {
        Err(GenieError::SpaceNotFound(space_id.to_string()))
    }

    async fn delete_space(&self, _space_id: &str) -> Result<()> {
        self.off_script("delete_space")
    }

    async fn list_spaces(
        &self,
        _page_size: Option<u32>,
        _page_token: Option<String>,
    ) -> Result<SpaceList> {
        Ok(SpaceList {
            spaces: self.spaces.clone(),
            next_page_token: None,
        })
    }

    async fn list_conversations(
        &self,
        _space_id: &str,
        _page_size: Option<u32>,
        _page_token: Option<String>,
    ) -> Result<ConversationList> {
        self.off_script("list_conversations")
    }

    async fn list_messages(
        &self,
        _space_id: &str,
        _conversation_id: &str,
    ) -> Result<Vec<GenieMessage>> {
        self.off_script("list_messages")
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        self.off_script("list_warehouses")
    }

    async fn list_tables(
        &self,
        _catalog_name: &str,
        _schema_name: &str,
    ) -> Result<Vec<TableMetadata>> {
        self.off_script("list_tables")
    }

    async fn get_table(&self, _full_name: &str) -> Result<TableMetadata> {
        self.off_script("get_table")
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn ping_answers_before_initialize() {
    let server = server_with(Vec::new());
    assert_eq!(server.handle_ping().await.unwrap(), json!({}));
    assert!(!server.is_ready().await);
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let server = server_with(Vec::new());

    let err = server.handle_tools_list().await.unwrap_err();
    assert_eq!(err.error_code(), -32002);

    let err = server
        .handle_tools_call(call("get_rate_limit_status", json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), -32002);

    let err = server.handle_prompts_list().await.unwrap_err();
    assert_eq!(err.error_code(), -32002);
}

#[tokio::test]
async fn initialize_echoes_a_supported_version() {
    for version in ["2024-11-05", "2025-06-18"] {
        let server = server_with(Vec::new());
        let result = server.handle_initialize(init_params(version)).await.unwrap();

        assert_eq!(result.protocol_version, version);
        assert_eq!(result.server_info.name, "genie-mcp-server");
        assert!(result.capabilities.tools.is_some());
        assert!(result.capabilities.prompts.is_some());
        assert!(server.is_ready().await);
    }
}

#[tokio::test]
async fn unsupported_protocol_version_is_rejected() {
    let server = server_with(Vec::new());
    let err = server
        .handle_initialize(init_params("1999-01-01"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), -32003);
    assert!(err.message().contains("1999-01-01"));
    assert!(!server.is_ready().await);
}

// ============================================================================
// Tools
// ============================================================================

#[tokio::test]
async fn tools_list_advertises_the_full_surface() {
    let server = initialized(Vec::new()).await;
    let tools = server.handle_tools_list().await.unwrap().tools;

    assert_eq!(tools.len(), 15);
    for name in ["ask_genie", "create_genie_space", "get_rate_limit_status"] {
        assert!(tools.iter().any(|t| t.name == name), "missing {name}");
    }
}

#[tokio::test]
async fn tool_results_are_pretty_json_content() {
    let server = initialized(vec![summary("s-1", "Sales Analytics")]).await;
    let result = server
        .handle_tools_call(call("list_genie_spaces", json!({})))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(false));
    assert_eq!(result.content.len(), 1);
    let payload: Value = serde_json::from_str(text_of(&result.content[0])).unwrap();
    assert_eq!(payload["spaces"][0]["space_id"], "s-1");
    assert_eq!(payload["spaces"][0]["title"], "Sales Analytics");
}

#[tokio::test]
async fn backend_failures_are_reported_in_band() {
    let server = initialized(Vec::new()).await;
    let result = server
        .handle_tools_call(call("get_genie_space", json!({"space_id": "s-missing"})))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    assert!(text_of(&result.content[0]).contains("Genie space not found: s-missing"));
}

#[tokio::test]
async fn unknown_tool_is_method_not_found() {
    let server = initialized(Vec::new()).await;
    let err = server
        .handle_tools_call(call("drop_all_tables", json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), -32601);
    assert!(err.message().contains("drop_all_tables"));
}

#[tokio::test]
async fn malformed_tool_arguments_are_invalid_params() {
    let server = initialized(Vec::new()).await;
    // get_genie_space requires space_id.
    let err = server
        .handle_tools_call(call("get_genie_space", json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), -32602);
}

// ============================================================================
// Prompts
// ============================================================================

#[tokio::test]
async fn prompts_list_names_the_four_skills() {
    let server = initialized(Vec::new()).await;
    let prompts = server.handle_prompts_list().await.unwrap().prompts;

    let names: Vec<&str> = prompts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["ask", "create_space", "inspect", "bulk"]);
}

#[tokio::test]
async fn prompts_get_renders_skill_markdown() {
    let server = initialized(Vec::new()).await;
    // No space is resolvable, so the ask skill renders its guidance error
    // without touching the backend.
    let result = server
        .handle_prompts_get(prompt("ask", json!({"question": "How many orders?"})))
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].role, "user");
    let text = &result.messages[0].content.text;
    assert!(text.contains("### How many orders?"), "got: {text}");
    assert!(text.contains("No space ID provided"), "got: {text}");
}

#[tokio::test]
async fn unknown_prompt_is_invalid_params() {
    let server = initialized(Vec::new()).await;
    let err = server
        .handle_prompts_get(prompt("nope", json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), -32602);
    assert!(err.message().contains("nope"));
}
