//! Space configuration lifecycle against an in-memory workspace double:
//! create from a typed config, read it back, partial updates, deletion, and
//! Unity Catalog metadata lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use genie_core::client::{GenieApi, SpaceCreate, SpaceUpdate};
use genie_core::model::{
    ColumnMetadata, ConversationList, ExampleQuery, GenieMessage, Instruction, JoinSpec,
    MessageHandle, QueryResult, Space, SpaceList, SpaceSummary, SqlSnippet, SqlSnippets,
    TableMetadata, TableRef, Warehouse,
};
use genie_core::{GenieConfig, GenieError, GenieService, Result, SpaceConfig};

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config() -> GenieConfig {
    GenieConfig {
        host: "https://unit.test.databricks.com".to_string(),
        token: Some("dapi-test".to_string()),
        request_timeout_seconds: 10,
        timeout_seconds: 300,
        poll_interval_seconds: 2,
        max_retries: 0,
        rate_limit_max_requests: 5,
        rate_limit_window_seconds: 60,
    }
}

fn sales_config() -> SpaceConfig {
    SpaceConfig {
        space_name: "Sales Analytics".to_string(),
        description: "Natural language querying over sales orders".to_string(),
        purpose: None,
        tables: vec![
            TableRef::new("main", "sales", "orders"),
            TableRef::new("main", "sales", "customers"),
        ],
        instructions: vec![Instruction::new(
            "Use `order_date` for date filtering, not `created_at`.",
        )],
        sql_snippets: SqlSnippets {
            measures: vec![SqlSnippet {
                display_name: "Total Revenue".to_string(),
                sql: "SUM(amount)".to_string(),
                synonyms: vec!["sales".to_string()],
                instruction: None,
            }],
            expressions: vec![],
            filters: vec![],
        },
        join_specifications: vec![JoinSpec {
            left_table: "main.sales.orders".to_string(),
            right_table: "main.sales.customers".to_string(),
            join_type: "LEFT".to_string(),
            join_condition: "orders.customer_id = customers.id".to_string(),
            description: None,
            instruction: None,
        }],
        example_sql_queries: vec![ExampleQuery {
            question: "What was total revenue last month?".to_string(),
            sql_query: "SELECT SUM(amount) FROM main.sales.orders WHERE order_date >= date_trunc('month', current_date) - INTERVAL 1 MONTH".to_string(),
            description: None,
        }],
        benchmark_questions: vec![],
    }
}

fn orders_table() -> TableMetadata {
    TableMetadata {
        name: "orders".to_string(),
        catalog_name: "main".to_string(),
        schema_name: "sales".to_string(),
        comment: Some("One row per order".to_string()),
        columns: vec![ColumnMetadata {
            name: "amount".to_string(),
            type_name: "DECIMAL(10,2)".to_string(),
            comment: None,
            nullable: false,
        }],
    }
}

fn customers_table() -> TableMetadata {
    TableMetadata {
        name: "customers".to_string(),
        catalog_name: "main".to_string(),
        schema_name: "sales".to_string(),
        comment: None,
        columns: vec![],
    }
}

// ============================================================================
// In-memory workspace double
// ============================================================================

/// Stores spaces and catalog tables in memory and answers the subset of
/// [`GenieApi`] the configuration lifecycle needs.
struct FakeWorkspace {
    spaces: Mutex<HashMap<String, Space>>,
    tables: Mutex<HashMap<String, TableMetadata>>,
    next_id: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    get_table_calls: AtomicUsize,
    list_table_calls: AtomicUsize,
}

impl FakeWorkspace {
    fn new() -> Self {
        Self {
            spaces: Mutex::new(HashMap::new()),
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            deleted: Mutex::new(Vec::new()),
            get_table_calls: AtomicUsize::new(0),
            list_table_calls: AtomicUsize::new(0),
        }
    }

    fn with_tables(self, tables: Vec<TableMetadata>) -> Self {
        {
            let mut map = self.tables.lock().unwrap();
            for table in tables {
                map.insert(table.full_name(), table);
            }
        }
        self
    }

    fn seed_space(&self, space: Space) {
        self.spaces
            .lock()
            .unwrap()
            .insert(space.space_id.clone(), space);
    }

    fn off_script<T>(&self, what: &str) -> Result<T> {
        Err(GenieError::Api(format!("{what} is not scripted")))
    }
}

#[async_trait]
impl GenieApi for FakeWorkspace {
    async fn start_conversation(&self, _space_id: &str, _question: &str) -> Result<MessageHandle> {
        self.off_script("start_conversation")
    }

    async fn create_message(
        &self,
        _space_id: &str,
        _conversation_id: &str,
        _question: &str,
    ) -> Result<MessageHandle> {
        self.off_script("create_message")
    }

    async fn get_message(
        &self,
        _space_id: &str,
        _conversation_id: &str,
        _message_id: &str,
    ) -> Result<GenieMessage> {
        self.off_script("get_message")
    }

    async fn get_query_result(
        &self,
        _space_id: &str,
        _conversation_id: &str,
        _message_id: &str,
        _attachment_id: Option<String>,
    ) -> Result<QueryResult> {
        self.off_script("get_query_result")
    }

    async fn create_space(&self, request: SpaceCreate) -> Result<Space> {
        let id = format!("space-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let space = Space {
            space_id: id.clone(),
            title: request.title,
            description: Some(request.description),
            warehouse_id: Some(request.warehouse_id),
            serialized_space: Some(request.serialized_space),
        };
        self.spaces.lock().unwrap().insert(id, space.clone());
        Ok(space)
    }

    async fn update_space(&self, space_id: &str, request: SpaceUpdate) -> Result<Space> {
        let mut spaces = self.spaces.lock().unwrap();
        let space = spaces
            .get_mut(space_id)
            .ok_or_else(|| GenieError::SpaceNotFound(space_id.to_string()))?;
        if let Some(serialized) = request.serialized_space {
            space.serialized_space = Some(serialized);
        }
        if let Some(title) = request.title {
            space.title = title;
        }
        if let Some(description) = request.description {
            space.description = Some(description);
        }
        if let Some(warehouse_id) = request.warehouse_id {
            space.warehouse_id = Some(warehouse_id);
        }
        Ok(space.clone())
    }

    async fn get_space(&self, space_id: &str, include_serialized: bool) -> Result<Space> {
        let spaces = self.spaces.lock().unwrap();
        let mut space = spaces
            .get(space_id)
            .cloned()
            .ok_or_else(|| GenieError::SpaceNotFound(space_id.to_string()))?;
        if !include_serialized {
            space.serialized_space = None;
        }
        Ok(space)
    }

    async fn delete_space(&self, space_id: &str) -> Result<()> {
        let removed = self.spaces.lock().unwrap().remove(space_id);
        match removed {
            Some(_) => {
                self.deleted.lock().unwrap().push(space_id.to_string());
                Ok(())
            }
            None => Err(GenieError::SpaceNotFound(space_id.to_string())),
        }
    }

    async fn list_spaces(
        &self,
        _page_size: Option<u32>,
        _page_token: Option<String>,
    ) -> Result<SpaceList> {
        let spaces = self.spaces.lock().unwrap();
        let mut summaries: Vec<SpaceSummary> = spaces
            .values()
            .map(|space| SpaceSummary {
                space_id: space.space_id.clone(),
                title: space.title.clone(),
                description: space.description.clone(),
                warehouse_id: space.warehouse_id.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.space_id.cmp(&b.space_id));
        Ok(SpaceList {
            spaces: summaries,
            next_page_token: None,
        })
    }

    async fn list_conversations(
        &self,
        _space_id: &str,
        _page_size: Option<u32>,
        _page_token: Option<String>,
    ) -> Result<ConversationList> {
        self.off_script("list_conversations")
    }

    async fn list_messages(
        &self,
        _space_id: &str,
        _conversation_id: &str,
    ) -> Result<Vec<GenieMessage>> {
        self.off_script("list_messages")
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        self.off_script("list_warehouses")
    }

    async fn list_tables(
        &self,
        catalog_name: &str,
        schema_name: &str,
    ) -> Result<Vec<TableMetadata>> {
        self.list_table_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        let mut found: Vec<TableMetadata> = tables
            .values()
            .filter(|t| t.catalog_name == catalog_name && t.schema_name == schema_name)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn get_table(&self, full_name: &str) -> Result<TableMetadata> {
        self.get_table_calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .unwrap()
            .get(full_name)
            .cloned()
            .ok_or_else(|| GenieError::ResourceNotFound(full_name.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn create_then_read_back_preserves_the_configuration() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());
    let config = sales_config();

    let space = service
        .create_space_from_config(&config, "warehouse-1", None, None, None)
        .await
        .unwrap();
    assert_eq!(space.space_id, "space-1");
    assert_eq!(space.title, "Sales Analytics");
    assert_eq!(space.warehouse_id.as_deref(), Some("warehouse-1"));
    assert!(space.serialized_space.is_some());

    let (recovered, warnings) = service.read_space_as_config("space-1").await.unwrap();
    assert!(warnings.is_empty(), "round trip warned: {warnings:?}");

    // Title flows back as the space name; stored content survives intact.
    assert_eq!(recovered.space_name, "Sales Analytics");
    assert_eq!(recovered.description, config.description);
    assert_eq!(
        recovered
            .tables
            .iter()
            .map(|t| t.fully_qualified())
            .collect::<Vec<_>>(),
        vec!["main.sales.orders", "main.sales.customers"]
    );
    assert_eq!(recovered.instructions, config.instructions);
    assert_eq!(recovered.sql_snippets, config.sql_snippets);
    assert_eq!(recovered.join_specifications, config.join_specifications);
    assert_eq!(recovered.example_sql_queries, config.example_sql_queries);
}

#[tokio::test]
async fn create_rejects_an_invalid_configuration() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());

    let config = SpaceConfig {
        space_name: "Empty".to_string(),
        ..Default::default()
    };
    let err = service
        .create_space_from_config(&config, "warehouse-1", None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GenieError::Validation(_)));
    assert!(api.spaces.lock().unwrap().is_empty());

    let err = service
        .create_space_from_config(&sales_config(), "  ", None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GenieError::Validation(_)));
}

#[tokio::test]
async fn update_requires_at_least_one_change() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());

    let err = service
        .update_space("space-1", None, None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GenieError::Validation(_)));
}

#[tokio::test]
async fn title_only_update_leaves_the_configuration_alone() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());

    service
        .create_space_from_config(&sales_config(), "warehouse-1", None, None, None)
        .await
        .unwrap();
    let before = service.get_space("space-1", true).await.unwrap();

    let updated = service
        .update_space("space-1", None, Some("Sales (EMEA)".to_string()), None, None)
        .await
        .unwrap();
    assert_eq!(updated.title, "Sales (EMEA)");
    assert_eq!(updated.serialized_space, before.serialized_space);
}

#[tokio::test]
async fn reading_a_space_without_configuration_is_an_api_error() {
    let api = Arc::new(FakeWorkspace::new());
    api.seed_space(Space {
        space_id: "bare".to_string(),
        title: "Bare".to_string(),
        description: None,
        warehouse_id: None,
        serialized_space: None,
    });
    let service = GenieService::new(api.clone(), test_config());

    let err = service.read_space_as_config("bare").await.unwrap_err();
    assert!(matches!(err, GenieError::Api(_)));
    assert!(err.to_string().contains("no serialized configuration"));
}

#[tokio::test]
async fn get_space_can_omit_the_serialized_payload() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());

    service
        .create_space_from_config(&sales_config(), "warehouse-1", None, None, None)
        .await
        .unwrap();

    let lean = service.get_space("space-1", false).await.unwrap();
    assert!(lean.serialized_space.is_none());
    let full = service.get_space("space-1", true).await.unwrap();
    assert!(full.serialized_space.is_some());
}

#[tokio::test]
async fn delete_removes_the_space() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());

    service
        .create_space_from_config(&sales_config(), "warehouse-1", None, None, None)
        .await
        .unwrap();
    service.delete_space("space-1").await.unwrap();

    assert_eq!(api.deleted.lock().unwrap().as_slice(), &["space-1"]);
    let err = service.get_space("space-1", false).await.unwrap_err();
    assert!(matches!(err, GenieError::SpaceNotFound(id) if id == "space-1"));
}

#[tokio::test]
async fn list_spaces_returns_summaries() {
    let api = Arc::new(FakeWorkspace::new());
    let service = GenieService::new(api.clone(), test_config());

    service
        .create_space_from_config(&sales_config(), "warehouse-1", None, None, None)
        .await
        .unwrap();
    service
        .create_space_from_config(
            &sales_config(),
            "warehouse-1",
            Some("Second Space".to_string()),
            None,
            None,
        )
        .await
        .unwrap();

    let listing = service.list_spaces(None, None).await.unwrap();
    assert_eq!(listing.spaces.len(), 2);
    assert_eq!(listing.spaces[0].space_id, "space-1");
    assert_eq!(listing.spaces[1].title, "Second Space");
}

#[tokio::test]
async fn named_tables_are_fetched_individually() {
    let api = Arc::new(
        FakeWorkspace::new().with_tables(vec![orders_table(), customers_table()]),
    );
    let service = GenieService::new(api.clone(), test_config());

    let tables = service
        .extract_table_metadata(
            "main",
            "sales",
            Some(vec!["orders".to_string(), "customers".to_string()]),
        )
        .await
        .unwrap();

    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].full_name(), "main.sales.orders");
    assert_eq!(tables[0].columns[0].type_name, "DECIMAL(10,2)");
    assert_eq!(api.get_table_calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.list_table_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn schema_wide_lookup_lists_the_schema() {
    let api = Arc::new(
        FakeWorkspace::new().with_tables(vec![orders_table(), customers_table()]),
    );
    let service = GenieService::new(api.clone(), test_config());

    let tables = service
        .extract_table_metadata("main", "sales", None)
        .await
        .unwrap();

    assert_eq!(tables.len(), 2);
    assert_eq!(api.list_table_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.get_table_calls.load(Ordering::SeqCst), 0);

    let err = service
        .extract_table_metadata("", "sales", None)
        .await
        .unwrap_err();
    assert!(matches!(err, GenieError::Validation(_)));
}

#[tokio::test]
async fn missing_named_table_propagates_not_found() {
    let api = Arc::new(FakeWorkspace::new().with_tables(vec![orders_table()]));
    let service = GenieService::new(api.clone(), test_config());

    let err = service
        .extract_table_metadata("main", "sales", Some(vec!["refunds".to_string()]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GenieError::ResourceNotFound(name) if name == "main.sales.refunds"
    ));
}
