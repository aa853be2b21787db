//! Bulk operations skill: batch instruction/table appends and id- or
//! pattern-based deletion, defaulting to dry-run previews.

use genie_core::model::{Instruction, TableRef};
use genie_core::GenieService;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::McpResult;
use crate::skills::{arg_bool, arg_str, required_str};

struct OpResult {
    space_id: String,
    name: String,
    success: bool,
    error: Option<String>,
}

impl OpResult {
    fn ok(space_id: &str, name: &str) -> Self {
        Self {
            space_id: space_id.to_string(),
            name: name.to_string(),
            success: true,
            error: None,
        }
    }

    fn failed(space_id: &str, name: &str, error: String) -> Self {
        Self {
            space_id: space_id.to_string(),
            name: name.to_string(),
            success: false,
            error: Some(error),
        }
    }
}

/// Run the `bulk` skill. Operations: `update`, `delete`, `clone`.
pub async fn run(service: &GenieService, args: &Value) -> McpResult<String> {
    let operation = required_str(args, "operation")?;
    let space_ids = arg_str(args, "space_ids");
    let pattern = arg_str(args, "pattern");
    let dry_run = arg_bool(args, "dry_run", true);
    debug!(target: "bulk_skill", operation = %operation, dry_run, "bulk skill invoked");

    match operation.as_str() {
        "update" => {
            let ids = match &space_ids {
                Some(raw) => split_comma(raw),
                None => return Ok("❌ **Error:** update operation requires space_ids".to_string()),
            };
            let instructions: Vec<String> = arg_str(args, "add_instructions")
                .map(|raw| {
                    raw.lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let tables = arg_str(args, "add_tables")
                .map(|raw| split_comma(&raw))
                .unwrap_or_default();
            Ok(bulk_update(service, &ids, &instructions, &tables, dry_run).await)
        }
        "delete" => match (&space_ids, &pattern) {
            (Some(raw), _) => Ok(bulk_delete_by_ids(service, &split_comma(raw), dry_run).await),
            (None, Some(pattern)) => Ok(bulk_delete_by_pattern(service, pattern, dry_run).await),
            (None, None) => {
                Ok("❌ **Error:** delete operation requires pattern or space_ids".to_string())
            }
        },
        "clone" => match &space_ids {
            Some(raw) if !raw.contains(',') => {
                Ok("❌ **Error:** Clone operation not yet implemented".to_string())
            }
            _ => Ok("❌ **Error:** clone operation requires exactly one space_id".to_string()),
        },
        other => Ok(format!(
            "❌ **Error:** Unknown operation '{other}'. Use: update, delete, or clone"
        )),
    }
}

fn split_comma(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

async fn bulk_update(
    service: &GenieService,
    space_ids: &[String],
    instructions: &[String],
    tables: &[String],
    dry_run: bool,
) -> String {
    if instructions.is_empty() && tables.is_empty() {
        return "❌ **Error:** Specify at least one of add_instructions or add_tables".to_string();
    }

    let mut output = format!("# 🔄 Bulk Update: {} Space(s)\n\n", space_ids.len());
    if dry_run {
        output.push_str("⚠️ **DRY RUN MODE** - No changes will be made\n\n");
    }

    output.push_str("## Changes to Apply\n\n");
    if !instructions.is_empty() {
        output.push_str(&format!("**Add Instructions:** {}\n", instructions.len()));
        for (index, instruction) in instructions.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", index + 1, instruction));
        }
        output.push('\n');
    }
    if !tables.is_empty() {
        output.push_str(&format!("**Add Tables:** {}\n", tables.len()));
        for table in tables {
            output.push_str(&format!("  - {table}\n"));
        }
        output.push('\n');
    }

    let mut results = Vec::new();
    for space_id in space_ids {
        let (mut config, _) = match service.read_space_as_config(space_id).await {
            Ok(read) => read,
            Err(err) => {
                results.push(OpResult::failed(space_id, "Unknown", err.to_string()));
                continue;
            }
        };
        let name = config.space_name.clone();

        let mut modified = false;
        for content in instructions {
            config.instructions.push(Instruction::new(content));
            modified = true;
        }
        for table in tables {
            // Entries that are not catalog.schema.table are skipped.
            match TableRef::parse(table) {
                Some(table_ref) => {
                    config.tables.push(table_ref);
                    modified = true;
                }
                None => {
                    warn!(target: "bulk_skill", table = %table, "skipping malformed table name")
                }
            }
        }

        if !dry_run && modified {
            match service
                .update_space(space_id, Some(&config), None, None, None)
                .await
            {
                Ok(_) => results.push(OpResult::ok(space_id, &name)),
                Err(err) => results.push(OpResult::failed(space_id, &name, err.to_string())),
            }
        } else {
            results.push(OpResult::ok(space_id, &name));
        }
    }

    output.push_str("## Results\n\n");
    let success_count = results.iter().filter(|r| r.success).count();
    for result in &results {
        let icon = if result.success { "✅" } else { "❌" };
        output.push_str(&format!(
            "{icon} **{}** (`{}`)\n",
            result.name, result.space_id
        ));
        if let Some(error) = &result.error {
            output.push_str(&format!("   - Error: {error}\n"));
        }
        output.push('\n');
    }

    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Successful:** {success_count} space(s)\n"));
    output.push_str(&format!(
        "- **Failed:** {} space(s)\n",
        results.len() - success_count
    ));

    if dry_run {
        output.push_str("\n⚠️ **To apply changes, set dry_run=false**\n");
    }

    output
}

async fn bulk_delete_by_ids(service: &GenieService, space_ids: &[String], dry_run: bool) -> String {
    let mut output = format!("# 🗑️ Bulk Delete: {} Space(s)\n\n", space_ids.len());
    if dry_run {
        output.push_str("⚠️ **DRY RUN MODE** - No deletions will be performed\n\n");
    } else {
        output.push_str("⚠️ **DESTRUCTIVE OPERATION** - Spaces will be permanently deleted\n\n");
    }

    let mut results = Vec::new();
    for space_id in space_ids {
        let space = match service.get_space(space_id, false).await {
            Ok(space) => space,
            Err(err) => {
                results.push(OpResult::failed(space_id, "Unknown", err.to_string()));
                continue;
            }
        };
        if dry_run {
            results.push(OpResult::ok(space_id, &space.title));
            continue;
        }
        match service.delete_space(space_id).await {
            Ok(()) => results.push(OpResult::ok(space_id, &space.title)),
            Err(err) => results.push(OpResult::failed(space_id, &space.title, err.to_string())),
        }
    }

    output.push_str("## Results\n\n");
    let success_count = results.iter().filter(|r| r.success).count();
    let action = if dry_run { "Would delete" } else { "Deleted" };
    for result in &results {
        let icon = if result.success { "✅" } else { "❌" };
        output.push_str(&format!(
            "{icon} **{action}:** {} (`{}`)\n",
            result.name, result.space_id
        ));
        if let Some(error) = &result.error {
            output.push_str(&format!("   - Error: {error}\n"));
        }
        output.push('\n');
    }

    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Successful:** {success_count} space(s)\n"));
    output.push_str(&format!(
        "- **Failed:** {} space(s)\n",
        results.len() - success_count
    ));

    if dry_run {
        output.push_str("\n⚠️ **To permanently delete, set dry_run=false**\n");
    }

    output
}

async fn bulk_delete_by_pattern(service: &GenieService, pattern: &str, dry_run: bool) -> String {
    let listing = match service.list_spaces(None, None).await {
        Ok(listing) => listing,
        Err(err) => return format!("❌ **Error:** {err}"),
    };

    let matching: Vec<String> = listing
        .spaces
        .iter()
        .filter(|space| title_matches(pattern, &space.title))
        .map(|space| space.space_id.clone())
        .collect();

    if matching.is_empty() {
        return format!("# 🗑️ Bulk Delete\n\n_No spaces matching pattern '{pattern}'_\n");
    }

    bulk_delete_by_ids(service, &matching, dry_run).await
}

/// Case-insensitive title match. Patterns containing `*` or `?` match the
/// whole title as a glob; anything else matches as a title prefix.
fn title_matches(pattern: &str, title: &str) -> bool {
    if pattern.contains('*') || pattern.contains('?') {
        glob_match(&pattern.to_lowercase(), &title.to_lowercase())
    } else {
        title.to_lowercase().starts_with(&pattern.to_lowercase())
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    fn matches(pattern: &[char], text: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some((&'*', rest)) => (0..=text.len()).any(|skip| matches(rest, &text[skip..])),
            Some((&'?', rest)) => !text.is_empty() && matches(rest, &text[1..]),
            Some((ch, rest)) => text
                .split_first()
                .map_or(false, |(first, tail)| first == ch && matches(rest, tail)),
        }
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches(&pattern, &text)
}
