//! Configuration helper tools (schema, templates, validation, catalog
//! metadata, limiter status).

use genie_core::{templates, validate, GenieService};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::McpResult;
use crate::protocol::Tool;
use crate::tools::parse_params;

fn default_domain() -> String {
    "minimal".to_string()
}

fn default_validate_sql() -> bool {
    true
}

/// Parameters for get_config_template tool
#[derive(Debug, Deserialize)]
struct GetConfigTemplateParams {
    #[serde(default = "default_domain")]
    domain: String,
}

/// Parameters for validate_space_config tool
#[derive(Debug, Deserialize)]
struct ValidateSpaceConfigParams {
    /// JSON string containing the configuration to validate
    config: String,
    #[serde(default = "default_validate_sql")]
    validate_sql: bool,
}

/// Parameters for extract_table_metadata tool
#[derive(Debug, Deserialize)]
struct ExtractTableMetadataParams {
    catalog_name: String,
    schema_name: String,
    /// Restrict the lookup to these table names (default: all in the schema)
    #[serde(default)]
    table_names: Option<Vec<String>>,
}

/// Get the JSON schema and workflow documentation for space configurations.
pub async fn get_config_schema(_service: &GenieService, _args: Option<Value>) -> McpResult<Value> {
    debug!(target: "mcp_tools", "get_config_schema called");
    Ok(templates::config_schema())
}

/// Get a pre-built configuration template for a business domain.
///
/// An unknown domain is reported in the result payload rather than as a
/// protocol error, so the caller sees the valid options.
pub async fn get_config_template(_service: &GenieService, args: Option<Value>) -> McpResult<Value> {
    let params: GetConfigTemplateParams = parse_params(args)?;
    debug!(target: "mcp_tools", domain = %params.domain, "get_config_template called");

    if !templates::DOMAINS.contains(&params.domain.as_str()) {
        return Ok(json!({
            "error": format!(
                "Invalid domain '{}'. Valid options: {}",
                params.domain,
                templates::DOMAINS.join(", ")
            ),
            "valid_domains": templates::DOMAINS,
        }));
    }

    let template = templates::template(&params.domain)?;
    Ok(serde_json::to_value(template)?)
}

/// Validate a space configuration JSON string.
pub async fn validate_space_config(
    _service: &GenieService,
    args: Option<Value>,
) -> McpResult<Value> {
    let params: ValidateSpaceConfigParams = parse_params(args)?;
    debug!(target: "mcp_tools", validate_sql = params.validate_sql, "validate_space_config called");

    let report = validate::validate_json(&params.config, params.validate_sql);
    Ok(serde_json::to_value(report)?)
}

/// Extract Unity Catalog table metadata for use as configuration context.
pub async fn extract_table_metadata(
    service: &GenieService,
    args: Option<Value>,
) -> McpResult<Value> {
    let params: ExtractTableMetadataParams = parse_params(args)?;
    debug!(
        target: "mcp_tools",
        catalog = %params.catalog_name,
        schema = %params.schema_name,
        "extract_table_metadata called"
    );

    let tables = service
        .extract_table_metadata(
            &params.catalog_name,
            &params.schema_name,
            params.table_names,
        )
        .await?;
    Ok(json!({
        "catalog_name": params.catalog_name,
        "schema_name": params.schema_name,
        "tables": serde_json::to_value(tables)?,
    }))
}

/// Get the current rate limiter status.
pub async fn get_rate_limit_status(
    service: &GenieService,
    _args: Option<Value>,
) -> McpResult<Value> {
    debug!(target: "mcp_tools", "get_rate_limit_status called");
    let status = service.rate_limit_status().await;
    Ok(serde_json::to_value(status)?)
}

pub(super) fn definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "get_config_schema".to_string(),
            description: "Get the JSON schema and documentation for Genie space configurations, including validation rules, best practices, a complete example, and the recommended workflow for building one.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
        Tool {
            name: "get_config_template".to_string(),
            description: "Get a pre-configured space template for a specific domain (minimal, sales, customer, inventory, financial, hr). Templates use [CATALOG], [SCHEMA], and [TABLE_NAME] placeholders for the caller to replace.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": {
                        "type": "string",
                        "description": "Type of analytics space (minimal/sales/customer/inventory/financial/hr)"
                    }
                },
                "additionalProperties": false
            }),
        },
        Tool {
            name: "validate_space_config".to_string(),
            description: "Validate a Genie space configuration. Checks structure, SQL syntax (optional), instruction quality, and completeness; returns errors, warnings, and a 0-100 quality score.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "config": {
                        "type": "string",
                        "description": "JSON string containing the configuration to validate"
                    },
                    "validate_sql": {
                        "type": "boolean",
                        "description": "Whether to validate SQL syntax (default: true)"
                    }
                },
                "required": ["config"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "extract_table_metadata".to_string(),
            description: "Extract metadata for Unity Catalog tables: columns, types, and comments. Useful as context when writing a space configuration.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "catalog_name": {
                        "type": "string",
                        "description": "Catalog name in Unity Catalog"
                    },
                    "schema_name": {
                        "type": "string",
                        "description": "Schema name in Unity Catalog"
                    },
                    "table_names": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional list of specific table names (default: all tables in the schema)"
                    }
                },
                "required": ["catalog_name", "schema_name"],
                "additionalProperties": false
            }),
        },
        Tool {
            name: "get_rate_limit_status".to_string(),
            description: "Get the current rate limiter status: window size, used and remaining request slots, and seconds until the next slot frees up.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
}
