//! Databricks REST transport: Genie spaces and conversations, SQL
//! warehouses, and Unity Catalog table metadata.
//!
//! [`GenieApi`] is the seam the service layer and tests program against;
//! [`GenieClient`] is the production implementation. Every call retries
//! transient failures with the shared backoff helper before surfacing an
//! error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::GenieConfig;
use crate::error::{translate_remote_error, GenieError, Result};
use crate::model::{
    ColumnInfo, ColumnMetadata, ConversationList, GenieMessage, MessageHandle, QueryResult,
    Space, SpaceList, TableMetadata, Warehouse, MAX_RESULT_ROWS,
};
use crate::poll::with_retries;

/// Request payload for space creation.
#[derive(Debug, Clone, Serialize)]
pub struct SpaceCreate {
    pub warehouse_id: String,
    pub serialized_space: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

/// Request payload for a partial space update. Absent fields are left
/// untouched on the remote side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
}

/// Everything the service layer needs from the Databricks workspace.
///
/// Kept as a trait so tests can script responses without a network.
#[async_trait]
pub trait GenieApi: Send + Sync {
    /// Open a new conversation with an initial question.
    async fn start_conversation(&self, space_id: &str, question: &str) -> Result<MessageHandle>;

    /// Append a follow-up question to an existing conversation.
    async fn create_message(
        &self,
        space_id: &str,
        conversation_id: &str,
        question: &str,
    ) -> Result<MessageHandle>;

    /// Fetch the current state of a message.
    async fn get_message(
        &self,
        space_id: &str,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<GenieMessage>;

    /// Fetch the tabular result of a completed message, optionally scoped
    /// to one attachment.
    async fn get_query_result(
        &self,
        space_id: &str,
        conversation_id: &str,
        message_id: &str,
        attachment_id: Option<String>,
    ) -> Result<QueryResult>;

    async fn create_space(&self, request: SpaceCreate) -> Result<Space>;
    async fn update_space(&self, space_id: &str, request: SpaceUpdate) -> Result<Space>;
    async fn get_space(&self, space_id: &str, include_serialized: bool) -> Result<Space>;
    /// Soft delete: the space is moved to the workspace trash.
    async fn delete_space(&self, space_id: &str) -> Result<()>;
    async fn list_spaces(
        &self,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Result<SpaceList>;

    async fn list_conversations(
        &self,
        space_id: &str,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Result<ConversationList>;
    async fn list_messages(
        &self,
        space_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<GenieMessage>>;

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>>;
    async fn list_tables(&self, catalog_name: &str, schema_name: &str)
        -> Result<Vec<TableMetadata>>;
    async fn get_table(&self, full_name: &str) -> Result<TableMetadata>;
}

/// Production [`GenieApi`] over the Databricks REST API.
pub struct GenieClient {
    http: Client,
    base_url: String,
    token: String,
    max_retries: u32,
}

impl GenieClient {
    pub fn new(config: &GenieConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| GenieError::Api(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            token: config.token.clone().unwrap_or_default(),
            max_retries: config.max_retries,
        })
    }

    /// One HTTP exchange: no retries, status translated into the taxonomy.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        resource: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(target: "genie_client", %method, path, "sending request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                GenieError::Transient(format!("{} {} failed: {}", method, path, e))
            } else {
                GenieError::Api(format!("{} {} failed: {}", method, path, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(target: "genie_client", %method, path, status = status.as_u16(), "request failed");
            return Err(translate_remote_error(Some(status.as_u16()), &detail, resource));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response
            .text()
            .await
            .map_err(|e| GenieError::Transient(format!("{} {} body read failed: {}", method, path, e)))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            GenieError::Api(format!("{} {} returned malformed JSON: {}", method, path, e))
        })
    }

    /// Retry wrapper around [`Self::execute`] plus typed decoding.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        resource: Option<&str>,
    ) -> Result<T> {
        let what = format!("{} {}", method, path);
        let raw = with_retries(self.max_retries, &what, || {
            self.execute(method.clone(), path, query, body.as_ref(), resource)
        })
        .await?;
        serde_json::from_value(raw)
            .map_err(|e| GenieError::Api(format!("{what} returned an unexpected shape: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct IdEnvelope {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StartConversationResponse {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    conversation: Option<IdEnvelope>,
    #[serde(default)]
    message: Option<IdEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageListEnvelope {
    #[serde(default)]
    messages: Vec<GenieMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct WarehouseListEnvelope {
    #[serde(default)]
    warehouses: Vec<Warehouse>,
}

// Statement execution shapes, as nested under `statement_response` in the
// query-result payload.
#[derive(Debug, Default, Deserialize)]
struct StatementEnvelope {
    #[serde(default)]
    statement_response: StatementResponse,
}

#[derive(Debug, Default, Deserialize)]
struct StatementResponse {
    #[serde(default)]
    manifest: StatementManifest,
    #[serde(default)]
    result: StatementResult,
}

#[derive(Debug, Default, Deserialize)]
struct StatementManifest {
    #[serde(default)]
    schema: StatementSchema,
    #[serde(default)]
    total_row_count: Option<u64>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Default, Deserialize)]
struct StatementSchema {
    #[serde(default)]
    columns: Vec<StatementColumn>,
}

#[derive(Debug, Deserialize)]
struct StatementColumn {
    name: String,
    #[serde(default)]
    type_text: Option<String>,
    #[serde(default)]
    type_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data_array: Vec<Vec<Value>>,
}

fn into_query_result(envelope: StatementEnvelope) -> QueryResult {
    let statement = envelope.statement_response;
    let columns = statement
        .manifest
        .schema
        .columns
        .into_iter()
        .map(|c| ColumnInfo {
            name: c.name,
            type_name: c.type_text.or(c.type_name).unwrap_or_default(),
        })
        .collect();

    let mut rows = statement.result.data_array;
    let total = statement.manifest.total_row_count.unwrap_or(rows.len() as u64) as usize;
    let mut truncated = statement.manifest.truncated || total > rows.len();
    if rows.len() > MAX_RESULT_ROWS {
        rows.truncate(MAX_RESULT_ROWS);
        truncated = true;
    }

    QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    }
}

// Unity Catalog carries both `type_text` and `type_name` per column; we keep
// the human-readable one.
#[derive(Debug, Deserialize)]
struct UcColumn {
    name: String,
    #[serde(default)]
    type_text: Option<String>,
    #[serde(default)]
    type_name: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    nullable: bool,
}

#[derive(Debug, Deserialize)]
struct UcTable {
    name: String,
    #[serde(default)]
    catalog_name: String,
    #[serde(default)]
    schema_name: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    columns: Vec<UcColumn>,
}

#[derive(Debug, Default, Deserialize)]
struct UcTableListEnvelope {
    #[serde(default)]
    tables: Vec<UcTable>,
}

impl From<UcTable> for TableMetadata {
    fn from(table: UcTable) -> Self {
        TableMetadata {
            name: table.name,
            catalog_name: table.catalog_name,
            schema_name: table.schema_name,
            comment: table.comment,
            columns: table
                .columns
                .into_iter()
                .map(|c| ColumnMetadata {
                    name: c.name,
                    type_name: c.type_text.or(c.type_name).unwrap_or_default(),
                    comment: c.comment,
                    nullable: c.nullable,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl GenieApi for GenieClient {
    async fn start_conversation(&self, space_id: &str, question: &str) -> Result<MessageHandle> {
        let path = format!("/api/2.0/genie/spaces/{space_id}/start-conversation");
        let response: StartConversationResponse = self
            .call(
                Method::POST,
                &path,
                &[],
                Some(json!({ "content": question })),
                Some(space_id),
            )
            .await?;

        let conversation_id = response
            .conversation_id
            .or(response.conversation.map(|c| c.id))
            .ok_or_else(|| {
                GenieError::Api("start-conversation response missing conversation_id".to_string())
            })?;
        let message_id = response
            .message_id
            .or(response.message.map(|m| m.id))
            .ok_or_else(|| {
                GenieError::Api("start-conversation response missing message_id".to_string())
            })?;

        Ok(MessageHandle {
            conversation_id,
            message_id,
        })
    }

    async fn create_message(
        &self,
        space_id: &str,
        conversation_id: &str,
        question: &str,
    ) -> Result<MessageHandle> {
        let path =
            format!("/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages");
        let message: GenieMessage = self
            .call(
                Method::POST,
                &path,
                &[],
                Some(json!({ "content": question })),
                Some(space_id),
            )
            .await?;
        Ok(MessageHandle {
            conversation_id: conversation_id.to_string(),
            message_id: message.id,
        })
    }

    async fn get_message(
        &self,
        space_id: &str,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<GenieMessage> {
        let path = format!(
            "/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages/{message_id}"
        );
        let mut message: GenieMessage = self
            .call(Method::GET, &path, &[], None, Some(space_id))
            .await?;
        if message.conversation_id.is_empty() {
            message.conversation_id = conversation_id.to_string();
        }
        Ok(message)
    }

    async fn get_query_result(
        &self,
        space_id: &str,
        conversation_id: &str,
        message_id: &str,
        attachment_id: Option<String>,
    ) -> Result<QueryResult> {
        let path = match attachment_id {
            Some(attachment_id) => format!(
                "/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages/{message_id}/attachments/{attachment_id}/query-result"
            ),
            None => format!(
                "/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages/{message_id}/query-result"
            ),
        };
        let envelope: StatementEnvelope = self
            .call(Method::GET, &path, &[], None, Some(space_id))
            .await?;
        Ok(into_query_result(envelope))
    }

    async fn create_space(&self, request: SpaceCreate) -> Result<Space> {
        let body = serde_json::to_value(&request)?;
        self.call(Method::POST, "/api/2.0/genie/spaces", &[], Some(body), None)
            .await
    }

    async fn update_space(&self, space_id: &str, request: SpaceUpdate) -> Result<Space> {
        let path = format!("/api/2.0/genie/spaces/{space_id}");
        let body = serde_json::to_value(&request)?;
        self.call(Method::PATCH, &path, &[], Some(body), Some(space_id))
            .await
    }

    async fn get_space(&self, space_id: &str, include_serialized: bool) -> Result<Space> {
        let path = format!("/api/2.0/genie/spaces/{space_id}");
        let mut space: Space = self
            .call(Method::GET, &path, &[], None, Some(space_id))
            .await?;
        if !include_serialized {
            space.serialized_space = None;
        }
        Ok(space)
    }

    async fn delete_space(&self, space_id: &str) -> Result<()> {
        let path = format!("/api/2.0/genie/spaces/{space_id}");
        let _: Value = self
            .call(Method::DELETE, &path, &[], None, Some(space_id))
            .await?;
        Ok(())
    }

    async fn list_spaces(
        &self,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Result<SpaceList> {
        let mut query = Vec::new();
        if let Some(size) = page_size {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = page_token {
            query.push(("page_token", token));
        }
        self.call(Method::GET, "/api/2.0/genie/spaces", &query, None, None)
            .await
    }

    async fn list_conversations(
        &self,
        space_id: &str,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Result<ConversationList> {
        let path = format!("/api/2.0/genie/spaces/{space_id}/conversations");
        let mut query = Vec::new();
        if let Some(size) = page_size {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = page_token {
            query.push(("page_token", token));
        }
        self.call(Method::GET, &path, &query, None, Some(space_id))
            .await
    }

    async fn list_messages(
        &self,
        space_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<GenieMessage>> {
        let path =
            format!("/api/2.0/genie/spaces/{space_id}/conversations/{conversation_id}/messages");
        let envelope: MessageListEnvelope = self
            .call(Method::GET, &path, &[], None, Some(space_id))
            .await?;
        Ok(envelope.messages)
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        let envelope: WarehouseListEnvelope = self
            .call(Method::GET, "/api/2.0/sql/warehouses", &[], None, None)
            .await?;
        Ok(envelope.warehouses)
    }

    async fn list_tables(
        &self,
        catalog_name: &str,
        schema_name: &str,
    ) -> Result<Vec<TableMetadata>> {
        let query = vec![
            ("catalog_name", catalog_name.to_string()),
            ("schema_name", schema_name.to_string()),
        ];
        let envelope: UcTableListEnvelope = self
            .call(Method::GET, "/api/2.1/unity-catalog/tables", &query, None, None)
            .await?;
        Ok(envelope.tables.into_iter().map(TableMetadata::from).collect())
    }

    async fn get_table(&self, full_name: &str) -> Result<TableMetadata> {
        let path = format!("/api/2.1/unity-catalog/tables/{full_name}");
        let table: UcTable = self
            .call(Method::GET, &path, &[], None, Some(full_name))
            .await?;
        Ok(table.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_result_conversion_caps_and_flags_truncation() {
        let envelope: StatementEnvelope = serde_json::from_value(json!({
            "statement_response": {
                "manifest": {
                    "schema": {"columns": [
                        {"name": "region", "type_text": "string"},
                        {"name": "total", "type_text": "decimal(10,2)", "type_name": "DECIMAL"}
                    ]},
                    "total_row_count": 4
                },
                "result": {"data_array": [["west", "10.5"], ["east", "7.25"]]}
            }
        }))
        .unwrap();
        let result = into_query_result(envelope);
        assert_eq!(result.columns.len(), 2);
        assert_eq!(result.columns[0].name, "region");
        assert_eq!(result.columns[1].type_name, "decimal(10,2)");
        assert_eq!(result.row_count, 2);
        assert!(result.truncated, "total_row_count above returned rows");
    }

    #[test]
    fn query_result_conversion_handles_missing_sections() {
        let envelope: StatementEnvelope = serde_json::from_value(json!({})).unwrap();
        let result = into_query_result(envelope);
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
        assert_eq!(result.row_count, 0);
        assert!(!result.truncated);
    }

    #[test]
    fn start_conversation_response_accepts_both_shapes() {
        let flat: StartConversationResponse = serde_json::from_value(json!({
            "conversation_id": "c1", "message_id": "m1"
        }))
        .unwrap();
        assert_eq!(flat.conversation_id.as_deref(), Some("c1"));

        let nested: StartConversationResponse = serde_json::from_value(json!({
            "conversation": {"id": "c2"}, "message": {"id": "m2"}
        }))
        .unwrap();
        assert_eq!(nested.conversation.unwrap().id, "c2");
        assert_eq!(nested.message.unwrap().id, "m2");
    }

    #[test]
    fn space_update_serializes_only_present_fields() {
        let update = SpaceUpdate {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({"title": "New title"}));
    }

    #[test]
    fn uc_table_conversion_prefers_type_text() {
        let table: UcTable = serde_json::from_value(json!({
            "name": "orders",
            "catalog_name": "main",
            "schema_name": "sales",
            "comment": "Order facts",
            "columns": [
                {"name": "id", "type_text": "bigint", "type_name": "LONG", "nullable": false},
                {"name": "note", "type_name": "STRING", "nullable": true}
            ]
        }))
        .unwrap();
        let metadata: TableMetadata = table.into();
        assert_eq!(metadata.full_name(), "main.sales.orders");
        assert_eq!(metadata.columns[0].type_name, "bigint");
        assert_eq!(metadata.columns[1].type_name, "STRING");
        assert!(metadata.columns[1].nullable);
    }
}
