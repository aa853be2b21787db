//! Markdown rendering for query outcomes.
//!
//! Everything here is pure string building; the skills decide which renderer
//! applies to a given outcome.

use genie_core::{AskOutcome, QueryResult};
use serde_json::Value;

/// Rows shown in a result table before truncation, unless verbose.
const DEFAULT_ROW_LIMIT: usize = 10;

/// Render a completed outcome: question heading, narrative text, result
/// table (or single-value answer), collapsible SQL, and the follow-up footer.
pub fn format_outcome(outcome: &AskOutcome, question: &str, verbose: bool) -> String {
    let mut output = format!("### {question}\n\n");
    output.push_str(outcome.response_text.as_deref().unwrap_or("No response"));
    output.push_str("\n\n");

    if let Some(result) = &outcome.query_result {
        let rendered = format_results(result, verbose);
        if !rendered.is_empty() {
            output.push_str(&rendered);
            output.push('\n');
        }
    }

    if let Some(sql) = &outcome.sql_query {
        output.push_str("<details>\n<summary>📊 View SQL Query</summary>\n\n");
        output.push_str(&format!("```sql\n{sql}\n```\n</details>\n\n"));
    }

    output.push_str(&format!(
        "**Conversation ID:** `{}`\n\n",
        outcome.conversation_id
    ));
    output.push_str("💬 **Ask follow-up:** Use `/ask` with your next question\n");

    output
}

/// Render an error with generic troubleshooting suggestions.
pub fn format_error(error: &str, question: &str) -> String {
    let mut output = format!("### {question}\n\n");
    output.push_str(&format!("⚠️ **Error:** {error}\n\n"));
    output.push_str("**Suggestions:**\n");
    output.push_str("- Check that the space ID is correct\n");
    output.push_str("- Verify you have access to the space\n");
    output.push_str("- Try rephrasing your question\n");
    output
}

/// Render a client-side timeout.
pub fn format_timeout(question: &str, timeout: u64) -> String {
    let mut output = format!("### {question}\n\n");
    output.push_str(&format!(
        "⏳ **Query Timeout:** Query exceeded {timeout} seconds\n\n"
    ));
    output.push_str("**Possible causes:**\n");
    output.push_str("- Complex query on large dataset\n");
    output.push_str("- Warehouse cold-starting\n");
    output.push_str("- Network issues\n\n");
    output.push_str("**Suggestions:**\n");
    output.push_str(&format!("- Increase timeout (current: {timeout}s)\n"));
    output.push_str("- Simplify the question\n");
    output.push_str("- Check warehouse status\n");
    output
}

/// Render a rate-limit rejection.
pub fn format_rate_limit(question: &str, wait_seconds: u64) -> String {
    let mut output = format!("### {question}\n\n");
    output.push_str("⏳ **Rate Limit Reached**\n\n");
    output.push_str(&format!(
        "You've reached the limit of 5 queries per minute. \
         Please wait {wait_seconds} seconds before trying again.\n"
    ));
    output
}

fn format_results(result: &QueryResult, verbose: bool) -> String {
    if result.rows.is_empty() || result.columns.is_empty() {
        return String::new();
    }

    // Single value answers skip the table entirely.
    if result.rows.len() == 1 && result.rows[0].len() == 1 {
        return format!("**Answer:** {}\n", format_cell(&result.rows[0][0]));
    }

    let max_rows = if verbose { None } else { Some(DEFAULT_ROW_LIMIT) };
    format_table(result, max_rows)
}

fn format_table(result: &QueryResult, max_rows: Option<usize>) -> String {
    let shown = match max_rows {
        Some(max) => result.rows.len().min(max),
        None => result.rows.len(),
    };

    let mut output = String::from("| ");
    output.push_str(
        &result
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" | "),
    );
    output.push_str(" |\n| ");
    output.push_str(
        &result
            .columns
            .iter()
            .map(|_| "---")
            .collect::<Vec<_>>()
            .join(" | "),
    );
    output.push_str(" |\n");

    for row in &result.rows[..shown] {
        let cells: Vec<String> = row.iter().map(format_cell).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    if shown < result.rows.len() {
        output.push_str(&format!(
            "\n_Showing {} of {} rows_\n",
            shown,
            result.rows.len()
        ));
    }

    output
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => "_null_".to_string(),
        // Pipes would break the table layout.
        Value::String(s) => s.replace('|', "\\|"),
        other => other.to_string(),
    }
}
