//! MCP tools: space management, conversation/query access, and
//! configuration helpers, all running against a shared [`GenieService`].
//!
//! [`GenieService`]: genie_core::GenieService

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{McpError, McpResult};
use crate::protocol::Tool;

pub mod config;
pub mod conversation;
pub mod space;

pub use config::{
    extract_table_metadata, get_config_schema, get_config_template, get_rate_limit_status,
    validate_space_config,
};
pub use conversation::{
    ask_genie, continue_conversation, get_conversation_history, get_query_results,
    list_conversations,
};
pub use space::{
    create_genie_space, delete_genie_space, get_genie_space, list_genie_spaces,
    update_genie_space,
};

/// Parse tool arguments into a typed parameter struct. Absent arguments are
/// treated as an empty object so tools with only optional parameters accept
/// a bare call; missing required fields surface as invalid-params errors.
pub(crate) fn parse_params<T: DeserializeOwned>(args: Option<Value>) -> McpResult<T> {
    serde_json::from_value(args.unwrap_or_else(|| json!({})))
        .map_err(|e| McpError::InvalidParams(format!("Invalid parameters: {e}")))
}

/// Schemas for every tool this server advertises via `tools/list`.
pub fn definitions() -> Vec<Tool> {
    let mut tools = space::definitions();
    tools.extend(conversation::definitions());
    tools.extend(config::definitions());
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn advertises_fifteen_uniquely_named_tools() {
        let tools = definitions();
        assert_eq!(tools.len(), 15);

        let names: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());
        for expected in [
            "create_genie_space",
            "ask_genie",
            "get_config_template",
            "get_rate_limit_status",
        ] {
            assert!(names.contains(expected), "missing tool {expected}");
        }
    }

    #[test]
    fn every_schema_is_a_closed_object() {
        for tool in definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert_eq!(
                tool.input_schema["additionalProperties"],
                serde_json::json!(false),
                "{}",
                tool.name
            );
            assert!(!tool.description.is_empty(), "{}", tool.name);
        }
    }

    #[test]
    fn required_fields_exist_in_properties() {
        for tool in definitions() {
            let properties = tool.input_schema["properties"]
                .as_object()
                .expect("properties object");
            if let Some(required) = tool.input_schema.get("required") {
                for field in required.as_array().expect("required array") {
                    let field = field.as_str().expect("field name");
                    assert!(
                        properties.contains_key(field),
                        "{}: required field {field} not declared",
                        tool.name
                    );
                }
            }
        }
    }

    #[test]
    fn missing_required_params_are_invalid() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            space_id: String,
        }
        let err = parse_params::<Params>(None).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
        assert!(err.message().contains("Invalid parameters"));
    }

    #[test]
    fn optional_only_params_accept_a_bare_call() {
        #[derive(serde::Deserialize)]
        struct Params {
            #[serde(default)]
            page_size: Option<u32>,
        }
        let params: Params = parse_params(None).expect("empty args accepted");
        assert!(params.page_size.is_none());
    }
}
