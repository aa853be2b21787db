//! Conversational Q&A skill with space resolution and conversation reuse.

use genie_core::{AskOptions, GenieService, OutcomeStatus};
use serde_json::Value;
use tracing::debug;

use crate::error::McpResult;
use crate::skills::{arg_bool, arg_str, arg_u64, format, required_str};

const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Run the `ask` skill: resolve a space, reuse or start a conversation,
/// submit the question, and render the outcome as markdown.
///
/// Space resolution precedence: explicit `space_id`, then `space_name`
/// (exact title match before substring, case-insensitive), then the most
/// recently used space.
pub async fn run(service: &GenieService, args: &Value) -> McpResult<String> {
    let question = required_str(args, "question")?;
    let space_id = arg_str(args, "space_id");
    let space_name = arg_str(args, "space_name");
    let new_conversation = arg_bool(args, "new_conversation", false);
    let preview_only = arg_bool(args, "preview_only", false);
    let timeout = arg_u64(args, "timeout", DEFAULT_TIMEOUT_SECONDS);
    let verbose = arg_bool(args, "verbose", false);

    let space_id = match resolve_space(service, space_id, space_name).await {
        Some(space_id) => space_id,
        None => {
            return Ok(format::format_error(
                "No space ID provided and no recent conversation found. \
                 Please provide space_id or space_name.",
                &question,
            ))
        }
    };

    let conversation_id = if new_conversation {
        None
    } else {
        service.active_conversation(&space_id)
    };
    debug!(
        target: "ask_skill",
        space_id = %space_id,
        continuing = conversation_id.is_some(),
        "submitting question"
    );

    let options = AskOptions {
        timeout_seconds: timeout,
        poll_interval_seconds: service.config().poll_interval_seconds,
    };
    let outcome = match service
        .ask(&space_id, &question, conversation_id.as_deref(), Some(options))
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            let detail = err.to_string();
            let lower = detail.to_lowercase();
            if lower.contains("rate limit") || lower.contains("too many requests") {
                return Ok(format::format_rate_limit(&question, 60));
            }
            return Ok(format::format_error(&detail, &question));
        }
    };

    Ok(match outcome.status {
        OutcomeStatus::TimedOut => format::format_timeout(&question, timeout),
        OutcomeStatus::Failed | OutcomeStatus::Cancelled => {
            let detail = outcome
                .error
                .unwrap_or_else(|| "the query did not complete".to_string());
            format::format_error(&detail, &question)
        }
        OutcomeStatus::Completed => {
            let mut outcome = outcome;
            if preview_only {
                // Preview keeps the generated SQL but drops the data rows.
                outcome.query_result = None;
            }
            format::format_outcome(&outcome, &question, verbose)
        }
    })
}

/// Pick the space to query; `None` when nothing resolves.
async fn resolve_space(
    service: &GenieService,
    space_id: Option<String>,
    space_name: Option<String>,
) -> Option<String> {
    if let Some(id) = space_id {
        return Some(id);
    }

    if let Some(name) = space_name {
        // A listing failure falls through to the last-used space.
        if let Ok(listing) = service.list_spaces(None, None).await {
            let wanted = name.to_lowercase();
            if let Some(space) = listing
                .spaces
                .iter()
                .find(|s| s.title.to_lowercase() == wanted)
            {
                return Some(space.space_id.clone());
            }
            if let Some(space) = listing
                .spaces
                .iter()
                .find(|s| s.title.to_lowercase().contains(&wanted))
            {
                return Some(space.space_id.clone());
            }
        }
    }

    service.last_used_space()
}
