//! Orchestration layer over the raw transport: rate-limited question
//! submission with polling, configuration round-trips through the wire
//! format, and the listing passthroughs the tool surface exposes.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::{GenieApi, SpaceCreate, SpaceUpdate};
use crate::config::GenieConfig;
use crate::error::{GenieError, Result};
use crate::model::{
    AskOutcome, ConversationList, GenieMessage, MessageAttachment, MessageHandle, MessageStatus,
    OutcomeStatus, QueryResult, Space, SpaceConfig, SpaceList, TableMetadata, Warehouse,
};
use crate::poll::{poll_until, PollOutcome, PollSettings};
use crate::rate_limit::{RateLimitStatus, RateLimiter};
use crate::tracker::ConversationTracker;
use crate::transform::{from_wire_json, to_wire_json};

/// Per-question timing overrides; defaults come from [`GenieConfig`].
#[derive(Debug, Clone, Copy)]
pub struct AskOptions {
    pub timeout_seconds: u64,
    pub poll_interval_seconds: u64,
}

/// Shared entry point for every Genie operation. One instance per process,
/// handed around behind an `Arc`; the limiter and tracker are owned here so
/// all callers share the same admission window and conversation state.
pub struct GenieService {
    api: Arc<dyn GenieApi>,
    limiter: RateLimiter,
    tracker: ConversationTracker,
    config: GenieConfig,
}

impl GenieService {
    pub fn new(api: Arc<dyn GenieApi>, config: GenieConfig) -> Self {
        let limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_seconds),
        );
        Self {
            api,
            limiter,
            tracker: ConversationTracker::default(),
            config,
        }
    }

    /// Constructor with explicit components, used by tests that need a
    /// custom limiter window or tracker TTL.
    pub fn with_components(
        api: Arc<dyn GenieApi>,
        config: GenieConfig,
        limiter: RateLimiter,
        tracker: ConversationTracker,
    ) -> Self {
        Self {
            api,
            limiter,
            tracker,
            config,
        }
    }

    pub fn config(&self) -> &GenieConfig {
        &self.config
    }

    fn default_options(&self) -> AskOptions {
        AskOptions {
            timeout_seconds: self.config.timeout_seconds,
            poll_interval_seconds: self.config.poll_interval_seconds,
        }
    }

    /// Ask a question and wait for a terminal answer.
    ///
    /// Submission goes through the shared rate limiter. With a
    /// `conversation_id` the question continues that conversation; without
    /// one a fresh conversation is started. The client-side timeout is
    /// reported as a `TIMED_OUT` outcome, not an error, because the handle
    /// is still valid and the remote query may still finish.
    pub async fn ask(
        &self,
        space_id: &str,
        question: &str,
        conversation_id: Option<&str>,
        options: Option<AskOptions>,
    ) -> Result<AskOutcome> {
        if space_id.trim().is_empty() {
            return Err(GenieError::Validation(
                "space_id must not be empty".to_string(),
            ));
        }
        if question.trim().is_empty() {
            return Err(GenieError::Validation(
                "question must not be empty".to_string(),
            ));
        }
        let options = options.unwrap_or_else(|| self.default_options());
        let settings = PollSettings::new(options.timeout_seconds, options.poll_interval_seconds)?;

        self.limiter.acquire().await;

        let handle = match conversation_id {
            Some(conversation_id) => {
                self.api
                    .create_message(space_id, conversation_id, question)
                    .await?
            }
            None => self.api.start_conversation(space_id, question).await?,
        };
        self.tracker.record(space_id, &handle.conversation_id);
        info!(
            target: "genie_service",
            space_id,
            conversation_id = %handle.conversation_id,
            message_id = %handle.message_id,
            "question submitted"
        );

        let api = self.api.as_ref();
        let conversation_id = handle.conversation_id.as_str();
        let message_id = handle.message_id.as_str();
        let polled = poll_until(&settings, move || async move {
            let message = api.get_message(space_id, conversation_id, message_id).await?;
            if message.status.is_terminal() {
                Ok(PollOutcome::Complete(message))
            } else {
                Ok(PollOutcome::Pending)
            }
        })
        .await;

        let message = match polled {
            Ok(message) => message,
            Err(err @ GenieError::Timeout { .. }) => {
                return Ok(AskOutcome {
                    conversation_id: handle.conversation_id,
                    message_id: handle.message_id,
                    status: OutcomeStatus::TimedOut,
                    response_text: None,
                    sql_query: None,
                    query_result: None,
                    error: Some(err.to_string()),
                });
            }
            Err(err) => return Err(err),
        };

        // Refresh the TTL now that the answer arrived; the poll may have
        // taken a while.
        self.tracker.record(space_id, &handle.conversation_id);
        Ok(self.outcome_from_message(space_id, &handle, message).await)
    }

    /// Follow-up question on an existing conversation.
    pub async fn continue_conversation(
        &self,
        space_id: &str,
        conversation_id: &str,
        question: &str,
        options: Option<AskOptions>,
    ) -> Result<AskOutcome> {
        if conversation_id.trim().is_empty() {
            return Err(GenieError::Validation(
                "conversation_id must not be empty".to_string(),
            ));
        }
        self.ask(space_id, question, Some(conversation_id), options)
            .await
    }

    async fn outcome_from_message(
        &self,
        space_id: &str,
        handle: &MessageHandle,
        message: GenieMessage,
    ) -> AskOutcome {
        let (response_text, sql_query, attachment_id) = extract_attachments(&message.attachments);

        let mut error = message.error.as_ref().map(|e| e.detail());
        let status = match message.status {
            MessageStatus::Completed => OutcomeStatus::Completed,
            MessageStatus::Cancelled => OutcomeStatus::Cancelled,
            MessageStatus::QueryResultExpired => {
                if error.is_none() {
                    error = Some(
                        "the query result has expired; ask the question again to refresh it"
                            .to_string(),
                    );
                }
                OutcomeStatus::Completed
            }
            _ => OutcomeStatus::Failed,
        };

        let mut query_result = None;
        if status == OutcomeStatus::Completed
            && sql_query.is_some()
            && message.status != MessageStatus::QueryResultExpired
        {
            // Result rows are best effort once the answer itself is in hand.
            match self
                .api
                .get_query_result(
                    space_id,
                    &handle.conversation_id,
                    &handle.message_id,
                    attachment_id,
                )
                .await
            {
                Ok(result) => query_result = Some(result),
                Err(err) => {
                    warn!(
                        target: "genie_service",
                        space_id,
                        message_id = %handle.message_id,
                        error = %err,
                        "completed message but the query result fetch failed"
                    );
                }
            }
        }

        AskOutcome {
            conversation_id: handle.conversation_id.clone(),
            message_id: handle.message_id.clone(),
            status,
            response_text,
            sql_query,
            query_result,
            error,
        }
    }

    /// Active (unexpired) conversation for a space, if any.
    pub fn active_conversation(&self, space_id: &str) -> Option<String> {
        self.tracker.get_active(space_id)
    }

    /// Space of the most recently active conversation.
    pub fn last_used_space(&self) -> Option<String> {
        self.tracker.get_last_used_space()
    }

    /// Create a space from a validated [`SpaceConfig`], serializing it to
    /// the wire format first. Title and description default to the config's.
    pub async fn create_space_from_config(
        &self,
        config: &SpaceConfig,
        warehouse_id: &str,
        title: Option<String>,
        description: Option<String>,
        parent_path: Option<String>,
    ) -> Result<Space> {
        if warehouse_id.trim().is_empty() {
            return Err(GenieError::Validation(
                "warehouse_id must not be empty".to_string(),
            ));
        }
        config.validate()?;
        let serialized_space = to_wire_json(config)?;
        let space = self
            .api
            .create_space(SpaceCreate {
                warehouse_id: warehouse_id.to_string(),
                serialized_space,
                title: title.unwrap_or_else(|| config.space_name.clone()),
                description: description.unwrap_or_else(|| config.description.clone()),
                parent_path,
            })
            .await?;
        info!(target: "genie_service", space_id = %space.space_id, "space created");
        Ok(space)
    }

    /// Partial space update; a provided config replaces the serialized
    /// configuration wholesale.
    pub async fn update_space(
        &self,
        space_id: &str,
        config: Option<&SpaceConfig>,
        title: Option<String>,
        description: Option<String>,
        warehouse_id: Option<String>,
    ) -> Result<Space> {
        let serialized_space = match config {
            Some(config) => {
                config.validate()?;
                Some(to_wire_json(config)?)
            }
            None => None,
        };
        if serialized_space.is_none()
            && title.is_none()
            && description.is_none()
            && warehouse_id.is_none()
        {
            return Err(GenieError::Validation(
                "nothing to update: provide a config, title, description, or warehouse_id"
                    .to_string(),
            ));
        }
        self.api
            .update_space(
                space_id,
                SpaceUpdate {
                    serialized_space,
                    title,
                    description,
                    warehouse_id,
                },
            )
            .await
    }

    /// Read a space's serialized configuration back into a [`SpaceConfig`],
    /// with warnings for anything the reverse transform could not place.
    pub async fn read_space_as_config(
        &self,
        space_id: &str,
    ) -> Result<(SpaceConfig, Vec<String>)> {
        let space = self.api.get_space(space_id, true).await?;
        let serialized = space.serialized_space.as_deref().ok_or_else(|| {
            GenieError::Api(format!(
                "space {space_id} returned no serialized configuration"
            ))
        })?;
        let (mut config, warnings) = from_wire_json(serialized)?;
        if !space.title.is_empty() {
            config.space_name = space.title.clone();
        }
        if config.description.is_empty() {
            if let Some(description) = &space.description {
                config.description = description.clone();
            }
        }
        Ok((config, warnings))
    }

    pub async fn get_space(&self, space_id: &str, include_serialized: bool) -> Result<Space> {
        self.api.get_space(space_id, include_serialized).await
    }

    pub async fn delete_space(&self, space_id: &str) -> Result<()> {
        self.api.delete_space(space_id).await?;
        info!(target: "genie_service", space_id, "space moved to trash");
        Ok(())
    }

    pub async fn list_spaces(
        &self,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Result<SpaceList> {
        self.api.list_spaces(page_size, page_token).await
    }

    pub async fn list_conversations(
        &self,
        space_id: &str,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Result<ConversationList> {
        self.api
            .list_conversations(space_id, page_size, page_token)
            .await
    }

    /// All messages of one conversation, oldest first as the API returns
    /// them.
    pub async fn get_conversation_history(
        &self,
        space_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<GenieMessage>> {
        self.api.list_messages(space_id, conversation_id).await
    }

    pub async fn get_query_results(
        &self,
        space_id: &str,
        conversation_id: &str,
        message_id: &str,
        attachment_id: Option<String>,
    ) -> Result<QueryResult> {
        self.api
            .get_query_result(space_id, conversation_id, message_id, attachment_id)
            .await
    }

    pub async fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        self.api.list_warehouses().await
    }

    /// Unity Catalog lookup: either every table in a schema, or exactly the
    /// named ones.
    pub async fn extract_table_metadata(
        &self,
        catalog_name: &str,
        schema_name: &str,
        table_names: Option<Vec<String>>,
    ) -> Result<Vec<TableMetadata>> {
        if catalog_name.trim().is_empty() || schema_name.trim().is_empty() {
            return Err(GenieError::Validation(
                "catalog_name and schema_name are required".to_string(),
            ));
        }
        match table_names {
            Some(names) if !names.is_empty() => {
                let mut tables = Vec::with_capacity(names.len());
                for name in names {
                    let full_name = format!("{catalog_name}.{schema_name}.{name}");
                    tables.push(self.api.get_table(&full_name).await?);
                }
                Ok(tables)
            }
            _ => self.api.list_tables(catalog_name, schema_name).await,
        }
    }

    pub async fn rate_limit_status(&self) -> RateLimitStatus {
        self.limiter.status().await
    }
}

/// Pull the narrative text, the first generated SQL query, and that query's
/// attachment id out of a message's attachments. Multiple text attachments
/// are joined with blank lines.
fn extract_attachments(
    attachments: &[MessageAttachment],
) -> (Option<String>, Option<String>, Option<String>) {
    let mut response_text: Option<String> = None;
    let mut sql_query = None;
    let mut attachment_id = None;

    for attachment in attachments {
        if let Some(text) = &attachment.text {
            if !text.content.is_empty() {
                match &mut response_text {
                    Some(existing) => {
                        existing.push_str("\n\n");
                        existing.push_str(&text.content);
                    }
                    None => response_text = Some(text.content.clone()),
                }
            }
        }
        if sql_query.is_none() {
            if let Some(query) = &attachment.query {
                if !query.query.is_empty() {
                    sql_query = Some(query.query.clone());
                    attachment_id = attachment.attachment_id.clone();
                }
            }
        }
    }

    (response_text, sql_query, attachment_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttachmentQuery, AttachmentText};

    fn text_attachment(content: &str) -> MessageAttachment {
        MessageAttachment {
            attachment_id: None,
            text: Some(AttachmentText {
                content: content.to_string(),
            }),
            query: None,
        }
    }

    fn query_attachment(id: &str, sql: &str) -> MessageAttachment {
        MessageAttachment {
            attachment_id: Some(id.to_string()),
            text: None,
            query: Some(AttachmentQuery {
                query: sql.to_string(),
                description: None,
            }),
        }
    }

    #[test]
    fn attachment_extraction_joins_text_and_takes_first_query() {
        let attachments = vec![
            text_attachment("There were 42 orders."),
            query_attachment("a1", "SELECT COUNT(*) FROM orders"),
            text_attachment("Most were in the west region."),
            query_attachment("a2", "SELECT 1"),
        ];
        let (text, sql, attachment_id) = extract_attachments(&attachments);
        assert_eq!(
            text.as_deref(),
            Some("There were 42 orders.\n\nMost were in the west region.")
        );
        assert_eq!(sql.as_deref(), Some("SELECT COUNT(*) FROM orders"));
        assert_eq!(attachment_id.as_deref(), Some("a1"));
    }

    #[test]
    fn attachment_extraction_handles_empty() {
        let (text, sql, attachment_id) = extract_attachments(&[]);
        assert!(text.is_none());
        assert!(sql.is_none());
        assert!(attachment_id.is_none());
    }
}
