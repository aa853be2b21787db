//! Space management tools (create, list, get, update, delete).

use genie_core::{GenieService, SpaceConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::McpResult;
use crate::protocol::Tool;
use crate::tools::parse_params;

/// Parameters for create_genie_space tool
#[derive(Debug, Deserialize)]
struct CreateSpaceParams {
    /// SQL warehouse ID for query execution
    warehouse_id: String,
    /// JSON string containing the space configuration
    config_json: String,
    /// Optional space title (defaults to the config's space_name)
    #[serde(default)]
    title: Option<String>,
    /// Optional space description
    #[serde(default)]
    description: Option<String>,
    /// Optional parent path in the workspace
    #[serde(default)]
    parent_path: Option<String>,
}

/// Parameters for list_genie_spaces tool
#[derive(Debug, Deserialize)]
struct ListSpacesParams {
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    page_token: Option<String>,
}

/// Parameters for get_genie_space tool
#[derive(Debug, Deserialize)]
struct GetSpaceParams {
    space_id: String,
    /// Include the serialized configuration in the response
    #[serde(default)]
    include_config: bool,
}

/// Parameters for update_genie_space tool
#[derive(Debug, Deserialize)]
struct UpdateSpaceParams {
    space_id: String,
    /// Optional new configuration as a JSON string
    #[serde(default)]
    config_json: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    warehouse_id: Option<String>,
}

/// Parameters for delete_genie_space tool
#[derive(Debug, Deserialize)]
struct DeleteSpaceParams {
    space_id: String,
}

/// Create a new Genie space from a JSON configuration.
///
/// The configuration is validated and transformed to the serialized wire
/// format before submission.
pub async fn create_genie_space(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: CreateSpaceParams = parse_params(args)?;
    debug!(target: "mcp_tools", warehouse_id = %params.warehouse_id, "create_genie_space called");

    let config = SpaceConfig::from_json(&params.config_json)?;
    let space = service
        .create_space_from_config(
            &config,
            &params.warehouse_id,
            params.title,
            params.description,
            params.parent_path,
        )
        .await?;

    Ok(serde_json::to_value(space)?)
}

/// List all Genie spaces in the workspace.
pub async fn list_genie_spaces(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: ListSpacesParams = parse_params(args)?;
    debug!(target: "mcp_tools", "list_genie_spaces called");

    let listing = service
        .list_spaces(params.page_size, params.page_token)
        .await?;
    Ok(serde_json::to_value(listing)?)
}

/// Get details of a specific Genie space.
pub async fn get_genie_space(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: GetSpaceParams = parse_params(args)?;
    debug!(target: "mcp_tools", space_id = %params.space_id, "get_genie_space called");

    let space = service
        .get_space(&params.space_id, params.include_config)
        .await?;
    Ok(serde_json::to_value(space)?)
}

/// Update an existing Genie space. Configuration, title, description, and
/// warehouse can each be changed independently.
pub async fn update_genie_space(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: UpdateSpaceParams = parse_params(args)?;
    debug!(target: "mcp_tools", space_id = %params.space_id, "update_genie_space called");

    let config = match params.config_json.as_deref() {
        Some(json) => Some(SpaceConfig::from_json(json)?),
        None => None,
    };
    let space = service
        .update_space(
            &params.space_id,
            config.as_ref(),
            params.title,
            params.description,
            params.warehouse_id,
        )
        .await?;
    Ok(serde_json::to_value(space)?)
}

/// Delete a Genie space. This is a soft delete; the space moves to trash.
pub async fn delete_genie_space(service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: DeleteSpaceParams = parse_params(args)?;
    debug!(target: "mcp_tools", space_id = %params.space_id, "delete_genie_space called");

    service.delete_space(&params.space_id).await?;
    Ok(json!({
        "success": true,
        "space_id": params.space_id,
        "message": "Space moved to trash",
    }))
}

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "create_genie_space".to_string(),
            description: "Create a new Genie space from a JSON configuration. The configuration is validated and transformed to the serialized space format before submission.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "warehouse_id": {
                        "type": "string",
                        "description": "SQL warehouse ID for query execution"
                    },
                    "config_json": {
                        "type": "string",
                        "description": "JSON string containing the space configuration (see get_config_schema)"
                    },
                    "title": {
                        "type": "string",
                        "description": "Optional space title (defaults to the config's space_name)"
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional space description"
                    },
                    "parent_path": {
                        "type": "string",
                        "description": "Optional parent path in the workspace"
                    }
                },
                "required": ["warehouse_id", "config_json"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "list_genie_spaces".to_string(),
            description: "List all Genie spaces in the workspace with optional pagination."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_size": {
                        "type": "integer",
                        "description": "Number of spaces to return per page (default: all)"
                    },
                    "page_token": {
                        "type": "string",
                        "description": "Token for pagination to get the next page"
                    }
                },
                "additionalProperties": false
            }),
        },
        Tool {
            name: "get_genie_space".to_string(),
            description: "Get details of a specific Genie space, optionally including the serialized configuration.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the space"
                    },
                    "include_config": {
                        "type": "boolean",
                        "description": "Whether to include the serialized configuration (default: false)"
                    }
                },
                "required": ["space_id"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "update_genie_space".to_string(),
            description: "Update an existing Genie space. Configuration, title, description, and warehouse can each be changed independently.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the space"
                    },
                    "config_json": {
                        "type": "string",
                        "description": "Optional new configuration as a JSON string"
                    },
                    "title": {
                        "type": "string",
                        "description": "Optional new title"
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional new description"
                    },
                    "warehouse_id": {
                        "type": "string",
                        "description": "Optional new SQL warehouse ID"
                    }
                },
                "required": ["space_id"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "delete_genie_space".to_string(),
            description: "Delete a Genie space (soft delete - the space moves to trash)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_id": {
                        "type": "string",
                        "description": "Unique identifier for the space to delete"
                    }
                },
                "required": ["space_id"],
                "additionalProperties": false
            }),
        },
    ]
}
