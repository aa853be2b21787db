//! Space inspector skill: health reports, config export, diffs between two
//! spaces, and search across spaces by table or keyword.

use genie_core::{analyze, GenieService};
use serde_json::Value;
use tracing::debug;

use crate::error::McpResult;
use crate::skills::arg_str;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Run the `inspect` skill. `mode` selects health (default), export, diff,
/// or find.
pub async fn run(service: &GenieService, args: &Value) -> McpResult<String> {
    let mode = arg_str(args, "mode").unwrap_or_else(|| "health".to_string());
    let space_id = arg_str(args, "space_id");
    debug!(target: "inspect_skill", mode = %mode, "inspect skill invoked");

    match mode.as_str() {
        "health" => match space_id {
            Some(id) => Ok(health_check(service, &id).await),
            None => Ok(missing_space_id("health")),
        },
        "export" => match space_id {
            Some(id) => Ok(export_config(service, &id).await),
            None => Ok(missing_space_id("export")),
        },
        "diff" => match (space_id, arg_str(args, "compare_with")) {
            (None, _) => Ok(missing_space_id("diff")),
            (Some(_), None) => {
                Ok("❌ **Error:** diff mode requires compare_with parameter".to_string())
            }
            (Some(id), Some(other)) => Ok(diff_configs(service, &id, &other).await),
        },
        "find" => {
            let tables = parse_list(arg_str(args, "search_tables"));
            let keywords = parse_list(arg_str(args, "search_keywords"));
            Ok(find_spaces(service, &tables, &keywords).await)
        }
        other => Ok(format!(
            "❌ **Error:** Unknown mode '{other}'. Use: health, export, diff, or find"
        )),
    }
}

fn missing_space_id(mode: &str) -> String {
    format!("❌ **Error:** space_id is required for {mode} mode")
}

/// Split a comma-separated argument into trimmed, non-empty entries.
fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

async fn health_check(service: &GenieService, space_id: &str) -> String {
    let (config, _) = match service.read_space_as_config(space_id).await {
        Ok(read) => read,
        Err(err) => return format!("❌ **Error:** {err}"),
    };

    // Activity is advisory; a failed listing must not sink the report.
    let (conversation_count, days_since_activity) =
        match service.list_conversations(space_id, None, None).await {
            Ok(list) => {
                let latest = list
                    .conversations
                    .iter()
                    .filter_map(|c| c.last_updated_timestamp.or(c.created_timestamp))
                    .max();
                let days = latest.map(|millis| {
                    let now = chrono::Utc::now().timestamp_millis();
                    ((now - millis) / MILLIS_PER_DAY).max(0)
                });
                (list.conversations.len(), days)
            }
            Err(_) => (0, None),
        };

    analyze::health_report(
        &config.space_name,
        &config,
        conversation_count,
        days_since_activity,
    )
}

async fn export_config(service: &GenieService, space_id: &str) -> String {
    let (config, _) = match service.read_space_as_config(space_id).await {
        Ok(read) => read,
        Err(err) => return format!("❌ **Error:** {err}"),
    };

    let mut output = format!("# 📦 Configuration Export: {}\n\n", config.space_name);
    output.push_str(&format!("**Space ID:** `{space_id}`\n\n"));

    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Tables:** {}\n", config.tables.len()));
    output.push_str(&format!(
        "- **Instructions:** {}\n",
        config.instructions.len()
    ));
    output.push_str(&format!(
        "- **Example Queries:** {}\n",
        config.example_sql_queries.len()
    ));
    if !config.sql_snippets.is_empty() {
        output.push_str(&format!(
            "- **SQL Measures:** {}\n",
            config.sql_snippets.measures.len()
        ));
        output.push_str(&format!(
            "- **SQL Expressions:** {}\n",
            config.sql_snippets.expressions.len()
        ));
        output.push_str(&format!(
            "- **SQL Filters:** {}\n",
            config.sql_snippets.filters.len()
        ));
    }
    if !config.join_specifications.is_empty() {
        output.push_str(&format!(
            "- **Join Specifications:** {}\n",
            config.join_specifications.len()
        ));
    }
    output.push('\n');

    output.push_str("## Configuration JSON\n\n");
    output.push_str("```json\n");
    output.push_str(&serde_json::to_string_pretty(&config).unwrap_or_default());
    output.push_str("\n```\n\n");

    output
}

async fn diff_configs(service: &GenieService, left_id: &str, right_id: &str) -> String {
    let (left, _) = match service.read_space_as_config(left_id).await {
        Ok(read) => read,
        Err(err) => return format!("❌ **Error:** {err}"),
    };
    let (right, _) = match service.read_space_as_config(right_id).await {
        Ok(read) => read,
        Err(err) => return format!("❌ **Error:** {err}"),
    };

    analyze::diff_report(
        &left.space_name,
        left_id,
        &left,
        &right.space_name,
        right_id,
        &right,
    )
}

async fn find_spaces(service: &GenieService, tables: &[String], keywords: &[String]) -> String {
    if tables.is_empty() && keywords.is_empty() {
        return "❌ **Error:** Provide at least one of search_tables or search_keywords"
            .to_string();
    }

    let listing = match service.list_spaces(None, None).await {
        Ok(listing) => listing,
        Err(err) => return format!("❌ **Error:** {err}"),
    };

    let mut matches: Vec<(String, String, String)> = Vec::new();
    for summary in &listing.spaces {
        // Spaces whose config cannot be read are skipped rather than
        // failing the whole search.
        let config = match service.read_space_as_config(&summary.space_id).await {
            Ok((config, _)) => config,
            Err(_) => continue,
        };
        let reason = if tables.is_empty() {
            None
        } else {
            analyze::table_match_reason(&config, tables)
        }
        .or_else(|| {
            if keywords.is_empty() {
                None
            } else {
                analyze::keyword_match_reason(&summary.title, &config, keywords)
            }
        });
        if let Some(reason) = reason {
            matches.push((summary.space_id.clone(), summary.title.clone(), reason));
        }
    }

    let mut output = String::from("# 🔍 Space Search Results\n\n");
    output.push_str("**Search criteria:**\n");
    if !tables.is_empty() {
        output.push_str(&format!("- Tables: {}\n", tables.join(", ")));
    }
    if !keywords.is_empty() {
        output.push_str(&format!("- Keywords: {}\n", keywords.join(", ")));
    }
    output.push('\n');

    if matches.is_empty() {
        output.push_str("_No matching spaces found_\n");
    } else {
        output.push_str(&format!("**Found {} matching space(s):**\n\n", matches.len()));
        for (space_id, title, reason) in &matches {
            output.push_str(&format!("### {title}\n"));
            output.push_str(&format!("- **Space ID:** `{space_id}`\n"));
            output.push_str(&format!("- **Match:** {reason}\n\n"));
        }
    }

    output
}
