//! Prompt skills: guided workflows rendered as markdown.
//!
//! Each skill takes the shared [`GenieService`](genie_core::GenieService) and
//! the raw `arguments` object from `prompts/get`. Prompt argument values
//! arrive as strings from most MCP clients, so the accessors here coerce
//! booleans and integers from either representation.

use serde_json::Value;

use crate::error::{McpError, McpResult};

pub mod ask;
pub mod bulk;
pub mod create;
pub mod format;
pub mod inspect;

/// String argument, trimmed; `None` when absent or blank.
pub(crate) fn arg_str(args: &Value, key: &str) -> Option<String> {
    let text = args.get(key)?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Required string argument; `InvalidParams` when absent or blank.
pub(crate) fn required_str(args: &Value, key: &str) -> McpResult<String> {
    arg_str(args, key)
        .ok_or_else(|| McpError::InvalidParams(format!("missing required argument '{key}'")))
}

/// Boolean argument, accepting `true`/`false` or their string forms.
pub(crate) fn arg_bool(args: &Value, key: &str, default: bool) -> bool {
    match args.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Unsigned integer argument, accepting numbers or numeric strings.
pub(crate) fn arg_u64(args: &Value, key: &str, default: u64) -> u64 {
    match args.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}
