//! Conversation and query tools (ask, continue, results, history).

use genie_core::{AskOptions, GenieService};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::McpResult;
use crate::protocol::Tool;
use crate::tools::parse_params;

fn default_timeout_seconds() -> u64 {
    300
}

fn default_poll_interval_seconds() -> u64 {
    2
}

fn default_page_size() -> u32 {
    50
}

/// Parameters for ask_genie tool
#[derive(Debug, Deserialize)]
struct AskGenieParams {
    space_id: String,
    /// Natural language question to ask
    question: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_poll_interval_seconds")]
    poll_interval_seconds: u64,
}

/// Parameters for continue_conversation tool
#[derive(Debug, Deserialize)]
struct ContinueConversationParams {
    space_id: String,
    conversation_id: String,
    /// Follow-up question
    question: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_poll_interval_seconds")]
    poll_interval_seconds: u64,
}

/// Parameters for get_query_results tool
#[derive(Debug, Deserialize)]
struct GetQueryResultsParams {
    space_id: String,
    conversation_id: String,
    message_id: String,
    #[serde(default)]
    attachment_id: Option<String>,
}

/// Parameters for list_conversations tool
#[derive(Debug, Deserialize)]
struct ListConversationsParams {
    space_id: String,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default)]
    page_token: Option<String>,
}

/// Parameters for get_conversation_history tool
#[derive(Debug, Deserialize)]
struct GetConversationHistoryParams {
    space_id: String,
    conversation_id: String,
}

/// Ask a question to Genie and wait for the response.
///
/// Rate limited to 5 queries per minute; polls until the query completes,
/// fails, or the timeout elapses. Always starts a new conversation; use
/// continue_conversation for follow-ups.
pub async fn ask_genie(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: AskGenieParams = parse_params(args)?;
    debug!(target: "mcp_tools", space_id = %params.space_id, "ask_genie called");

    let options = AskOptions {
        timeout_seconds: params.timeout_seconds,
        poll_interval_seconds: params.poll_interval_seconds,
    };
    let outcome = service
        .ask(&params.space_id, &params.question, None, Some(options))
        .await?;
    Ok(serde_json::to_value(outcome)?)
}

/// Continue an existing conversation with a follow-up question.
pub async fn continue_conversation(
    service: &GenieService,
    args: Option<Value>,
) -> McpResult<Value> {
    let params: ContinueConversationParams = parse_params(args)?;
    debug!(
        target: "mcp_tools",
        space_id = %params.space_id,
        conversation_id = %params.conversation_id,
        "continue_conversation called"
    );

    let options = AskOptions {
        timeout_seconds: params.timeout_seconds,
        poll_interval_seconds: params.poll_interval_seconds,
    };
    let outcome = service
        .continue_conversation(
            &params.space_id,
            &params.conversation_id,
            &params.question,
            Some(options),
        )
        .await?;
    Ok(serde_json::to_value(outcome)?)
}

/// Fetch query result data from a completed message.
pub async fn get_query_results(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: GetQueryResultsParams = parse_params(args)?;
    debug!(
        target: "mcp_tools",
        space_id = %params.space_id,
        message_id = %params.message_id,
        "get_query_results called"
    );

    let result = service
        .get_query_results(
            &params.space_id,
            &params.conversation_id,
            &params.message_id,
            params.attachment_id,
        )
        .await?;
    Ok(serde_json::to_value(result)?)
}

/// List conversations in a Genie space.
pub async fn list_conversations(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: ListConversationsParams = parse_params(args)?;
    debug!(target: "mcp_tools", space_id = %params.space_id, "list_conversations called");

    let listing = service
        .list_conversations(&params.space_id, Some(params.page_size), params.page_token)
        .await?;
    Ok(serde_json::to_value(listing)?)
}

/// Get all messages in a conversation.
pub async fn get_conversation_history(
    service: &GenieService,
    args: Option<Value>,
) -> McpResult<Value> {
    let params: GetConversationHistoryParams = parse_params(args)?;
    debug!(
        target: "mcp_tools",
        space_id = %params.space_id,
        conversation_id = %params.conversation_id,
        "get_conversation_history called"
    );

    let messages = service
        .get_conversation_history(&params.space_id, &params.conversation_id)
        .await?;
    Ok(json!({
        "conversation_id": params.conversation_id,
        "message_count": messages.len(),
        "messages": serde_json::to_value(messages)?,
    }))
}

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "ask_genie".to_string(),
            description: "Ask a question to Genie and wait for the response. Applies rate limiting (5 queries per minute) and polls until the query completes or times out. Starts a new conversation.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the Genie space"
                    },
                    "question": {
                        "type": "string",
                        "description": "Natural language question to ask"
                    },
                    "timeout_seconds": {
                        "type": "integer",
                        "description": "Maximum time to wait for a response (default: 300)"
                    },
                    "poll_interval_seconds": {
                        "type": "integer",
                        "description": "Time between status checks (default: 2)"
                    }
                },
                "required": ["space_id", "question"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "continue_conversation".to_string(),
            description: "Continue an existing conversation with a follow-up question. Genie keeps the conversation context, so follow-ups can reference earlier results.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the Genie space"
                    },
                    "conversation_id": {
                        "type": "string",
                        "description": "ID of the conversation to continue"
                    },
                    "question": {
                        "type": "string",
                        "description": "Follow-up question"
                    },
                    "timeout_seconds": {
                        "type": "integer",
                        "description": "Maximum time to wait for a response (default: 300)"
                    },
                    "poll_interval_seconds": {
                        "type": "integer",
                        "description": "Time between status checks (default: 2)"
                    }
                },
                "required": ["space_id", "conversation_id", "question"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "get_query_results".to_string(),
            description: "Fetch query result data from a completed message (up to 5,000 rows)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the Genie space"
                    },
                    "conversation_id": {
                        "type": "string",
                        "description": "ID of the conversation"
                    },
                    "message_id": {
                        "type": "string",
                        "description": "ID of the message with query results"
                    },
                    "attachment_id": {
                        "type": "string",
                        "description": "Optional specific attachment ID"
                    }
                },
                "required": ["space_id", "conversation_id", "message_id"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "list_conversations".to_string(),
            description: "List conversations in a Genie space.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the Genie space"
                    },
                    "page_size": {
                        "type": "integer",
                        "description": "Number of conversations to return (default: 50)"
                    },
                    "page_token": {
                        "type": "string",
                        "description": "Token for pagination"
                    }
                },
                "required": ["space_id"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "get_conversation_history".to_string(),
            description: "Get all messages in a conversation.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the Genie space"
                    },
                    "conversation_id": {
                        "type": "string",
                        "description": "ID of the conversation"
                    }
                },
                "required": ["space_id", "conversation_id"],
                "additionalProperties": false
            }),
        },
    ]
}
