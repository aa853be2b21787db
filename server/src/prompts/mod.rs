//! MCP prompts. Unlike static help text, these are live skills: invoking a
//! prompt runs the operation against the workspace and returns the rendered
//! markdown as a single user message.

use genie_core::GenieService;
use serde_json::{json, Value};

use crate::error::McpResult;
use crate::protocol::{Prompt, PromptArgument, PromptMessage, PromptsGetResult};
use crate::skills;

fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: Some(description.to_string()),
        required: Some(required),
    }
}

fn prompt_description(name: &str) -> Option<&'static str> {
    match name {
        "ask" => Some("Ask questions to Genie spaces with smart conversation tracking."),
        "create_space" => Some("Create a Genie space with a guided workflow."),
        "inspect" => Some("Inspect space configuration and health."),
        "bulk" => Some("Bulk operations on multiple spaces."),
        _ => None,
    }
}

/// All prompts this server advertises via `prompts/list`.
pub fn list_prompts() -> Vec<Prompt> {
    vec![
        Prompt {
            name: "ask".to_string(),
            description: prompt_description("ask").map(str::to_string),
            arguments: Some(vec![
                argument("question", "Natural language question to ask", true),
                argument("space_id", "Genie space ID (optional if space_name or a recent conversation exists)", false),
                argument("space_name", "Space name to resolve (exact match, then substring)", false),
                argument("new_conversation", "Start a new conversation instead of continuing (default: false)", false),
                argument("preview_only", "Return the generated SQL without result rows (default: false)", false),
                argument("timeout", "Maximum seconds to wait for a response (default: 300)", false),
                argument("verbose", "Show all result rows instead of the first 10 (default: false)", false),
            ]),
        },
        Prompt {
            name: "create_space".to_string(),
            description: prompt_description("create_space").map(str::to_string),
            arguments: Some(vec![
                argument("catalog_name", "Unity Catalog name", true),
                argument("schema_name", "Schema name", true),
                argument("table_names", "Comma-separated table names", true),
                argument("warehouse_id", "SQL warehouse ID (auto-discovered when omitted)", false),
                argument("domain", "Template domain: minimal/sales/customer/inventory/financial/hr (default: minimal)", false),
                argument("space_name", "Display name for the space", false),
                argument("quick", "Create immediately without review (default: false)", false),
                argument("expert", "Return the config JSON for manual editing (default: false)", false),
            ]),
        },
        Prompt {
            name: "inspect".to_string(),
            description: prompt_description("inspect").map(str::to_string),
            arguments: Some(vec![
                argument("space_id", "Space ID to inspect", true),
                argument("mode", "Operation mode: health/export/diff/find (default: health)", false),
                argument("compare_with", "Second space ID for diff mode", false),
                argument("search_tables", "Comma-separated table names for find mode", false),
                argument("search_keywords", "Comma-separated keywords for find mode", false),
            ]),
        },
        Prompt {
            name: "bulk".to_string(),
            description: prompt_description("bulk").map(str::to_string),
            arguments: Some(vec![
                argument("operation", "Operation type: update/delete/clone", true),
                argument("space_ids", "Comma-separated space IDs", false),
                argument("pattern", "Title pattern for delete mode (glob or prefix)", false),
                argument("add_instructions", "Newline-separated instructions to append", false),
                argument("add_tables", "Comma-separated catalog.schema.table names to append", false),
                argument("dry_run", "Preview changes without executing (default: true)", false),
            ]),
        },
    ]
}

/// Run the named prompt. `None` means the prompt does not exist; skill
/// output (including skill-level error markdown) comes back as one user
/// message.
pub async fn get_prompt(
    service: &GenieService,
    name: &str,
    arguments: Option<Value>,
) -> McpResult<Option<PromptsGetResult>> {
    let args = arguments.unwrap_or_else(|| json!({}));
    let markdown = match name {
        "ask" => skills::ask::run(service, &args).await?,
        "create_space" => skills::create::run(service, &args).await?,
        "inspect" => skills::inspect::run(service, &args).await?,
        "bulk" => skills::bulk::run(service, &args).await?,
        _ => return Ok(None),
    };

    Ok(Some(PromptsGetResult {
        description: prompt_description(name).map(str::to_string),
        messages: vec![PromptMessage::user_text(markdown)],
    }))
}
