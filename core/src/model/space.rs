use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GenieError, Result};

/// One Unity Catalog table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableRef {
    pub fn new(catalog: &str, schema: &str, table: &str) -> Self {
        Self {
            catalog_name: catalog.to_string(),
            schema_name: schema.to_string(),
            table_name: table.to_string(),
            description: None,
        }
    }

    /// Dotted `catalog.schema.table` identifier.
    pub fn fully_qualified(&self) -> String {
        format!("{}.{}.{}", self.catalog_name, self.schema_name, self.table_name)
    }

    /// Parse a dotted identifier; `None` unless it has exactly three segments.
    pub fn parse(identifier: &str) -> Option<Self> {
        let parts: Vec<&str> = identifier.split('.').collect();
        match parts.as_slice() {
            [catalog, schema, table]
                if !catalog.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Some(Self::new(catalog, schema, table))
            }
            _ => None,
        }
    }
}

/// Plain-text guidance shown to the Genie model. Priority is informational
/// only; the wire format keeps emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub content: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    1
}

impl Instruction {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            priority: default_priority(),
        }
    }
}

/// A reusable SQL fragment with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlSnippet {
    pub display_name: String,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// SQL snippets grouped the way the platform presents them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlSnippets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<SqlSnippet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<SqlSnippet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<SqlSnippet>,
}

impl SqlSnippets {
    pub fn is_empty(&self) -> bool {
        self.measures.is_empty() && self.expressions.is_empty() && self.filters.is_empty()
    }

    pub fn total(&self) -> usize {
        self.measures.len() + self.expressions.len() + self.filters.len()
    }
}

/// How two tables relate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub left_table: String,
    pub right_table: String,
    #[serde(default = "default_join_type")]
    pub join_type: String,
    pub join_condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

fn default_join_type() -> String {
    "INNER".to_string()
}

/// A question/SQL pair, doubling as a remote "sample question".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleQuery {
    pub question: String,
    pub sql_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A plain natural-language question without SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkQuestion {
    pub question: String,
}

/// User-facing configuration for one Genie space.
///
/// The wire transformer consumes this model; `validate` enforces the
/// structural invariants before anything reaches the network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub space_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<Instruction>,
    #[serde(default, skip_serializing_if = "SqlSnippets::is_empty")]
    pub sql_snippets: SqlSnippets,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub join_specifications: Vec<JoinSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example_sql_queries: Vec<ExampleQuery>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub benchmark_questions: Vec<BenchmarkQuestion>,
}

impl SpaceConfig {
    /// Parse and validate a JSON configuration in one step, so malformed
    /// input is rejected at the boundary.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SpaceConfig = serde_json::from_str(json)
            .map_err(|e| GenieError::Validation(format!("invalid configuration JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural invariants: at least one table, unique fully-qualified
    /// names, and joins that only reference known tables.
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(GenieError::Validation(
                "configuration must reference at least one table".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            let fqn = table.fully_qualified();
            if !seen.insert(fqn.clone()) {
                return Err(GenieError::Validation(format!(
                    "duplicate table reference: {}",
                    fqn
                )));
            }
        }

        let known: HashSet<String> = self
            .tables
            .iter()
            .flat_map(|t| [t.fully_qualified(), t.table_name.clone()])
            .collect();
        for join in &self.join_specifications {
            for side in [&join.left_table, &join.right_table] {
                if !known.contains(side.as_str()) {
                    return Err(GenieError::Validation(format!(
                        "join references unknown table: {}",
                        side
                    )));
                }
            }
        }

        Ok(())
    }
}
