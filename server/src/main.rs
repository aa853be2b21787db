//! Genie MCP server binary.
//!
//! Reads newline-delimited JSON-RPC 2.0 frames from stdin and writes
//! responses to stdout. Logs go to stderr so the protocol stream stays
//! clean.

use std::sync::Arc;

use genie_core::{GenieClient, GenieConfig, GenieService};
use genie_mcp_server::protocol::{
    InitializeParams, JsonRpcError, JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse,
    PromptsGetParams, ToolCallParams,
};
use genie_mcp_server::{McpError, McpResult, McpServer, StdioTransport};
use serde_json::Value;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GenieConfig::default();
    let client = match GenieClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!(target: "mcp_server", error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    info!(
        target: "mcp_server",
        host = %config.host,
        rate_limit = config.rate_limit_max_requests,
        window_seconds = config.rate_limit_window_seconds,
        "starting Genie MCP server on stdio"
    );

    let service = Arc::new(GenieService::new(Arc::new(client), config));
    let server = McpServer::new(service);
    let mut transport = StdioTransport::new();

    loop {
        let line = match transport.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!(target: "mcp_server", "stdin closed, shutting down");
                break;
            }
            Err(e) => {
                error!(target: "mcp_server", error = %e, "failed to read from stdin");
                break;
            }
        };

        if let Err(e) = process_line(&server, &mut transport, &line).await {
            error!(target: "mcp_server", error = %e, "failed to write response");
            break;
        }
    }
}

/// Handle one frame: parse, dispatch, write the reply.
///
/// Handler failures are answered in-stream as JSON-RPC error responses;
/// only transport failures bubble up.
async fn process_line(
    server: &McpServer,
    transport: &mut StdioTransport,
    line: &str,
) -> McpResult<()> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(target: "mcp_server", error = %e, "received malformed frame");
            let response = JsonRpcErrorResponse::new(
                Value::Null,
                JsonRpcError::new(-32700, "Parse error".to_string(), None),
            );
            return write_json(transport, &response).await;
        }
    };

    // Notifications carry no id and must never be answered.
    let request_id = match request.id {
        Some(id) => id,
        None => {
            debug!(target: "mcp_server", method = %request.method, "notification received");
            return Ok(());
        }
    };

    match dispatch(server, &request.method, request.params).await {
        Ok(result) => write_json(transport, &JsonRpcResponse::new(request_id, result)).await,
        Err(e) => {
            warn!(
                target: "mcp_server",
                method = %request.method,
                code = e.error_code(),
                error = %e,
                "request failed"
            );
            let response = JsonRpcErrorResponse::new(
                request_id,
                JsonRpcError::new(e.error_code(), e.message(), None),
            );
            write_json(transport, &response).await
        }
    }
}

async fn dispatch(
    server: &McpServer,
    method: &str,
    params: Option<Value>,
) -> McpResult<Value> {
    match method {
        "initialize" => {
            let params: InitializeParams = parse_request_params(params)?;
            let result = server.handle_initialize(params).await?;
            Ok(serde_json::to_value(result)?)
        }
        "ping" => server.handle_ping().await,
        "tools/list" => {
            let result = server.handle_tools_list().await?;
            Ok(serde_json::to_value(result)?)
        }
        "tools/call" => {
            let params: ToolCallParams = parse_request_params(params)?;
            let result = server.handle_tools_call(params).await?;
            Ok(serde_json::to_value(result)?)
        }
        "prompts/list" => {
            let result = server.handle_prompts_list().await?;
            Ok(serde_json::to_value(result)?)
        }
        "prompts/get" => {
            let params: PromptsGetParams = parse_request_params(params)?;
            let result = server.handle_prompts_get(params).await?;
            Ok(serde_json::to_value(result)?)
        }
        other => Err(McpError::MethodNotFound(other.to_string())),
    }
}

fn parse_request_params<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
) -> McpResult<T> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| McpError::InvalidParams(e.to_string()))
}

async fn write_json<T: serde::Serialize>(
    transport: &mut StdioTransport,
    payload: &T,
) -> McpResult<()> {
    let line = serde_json::to_string(payload)?;
    transport.write_line(&line).await
}
