//! Domain configuration templates and the machine-readable configuration
//! schema document.
//!
//! Templates carry `[CATALOG]`, `[SCHEMA]`, and `[TABLE_NAME]` placeholders;
//! [`generate_from_template`] substitutes real identifiers and fans the
//! table list out.

use serde_json::{json, Value};

use crate::error::{GenieError, Result};
use crate::model::{
    ExampleQuery, Instruction, SpaceConfig, SqlSnippet, SqlSnippets, TableRef,
};

pub const DOMAINS: [&str; 6] = ["minimal", "sales", "customer", "inventory", "financial", "hr"];

const CATALOG_PLACEHOLDER: &str = "[CATALOG]";
const SCHEMA_PLACEHOLDER: &str = "[SCHEMA]";
const TABLE_PLACEHOLDER: &str = "[TABLE_NAME]";
const FULL_TABLE_PLACEHOLDER: &str = "[TABLE]";

fn instruction(content: &str, priority: i32) -> Instruction {
    Instruction {
        content: content.to_string(),
        priority,
    }
}

fn example(question: &str, sql: &str) -> ExampleQuery {
    ExampleQuery {
        question: question.to_string(),
        sql_query: sql.to_string(),
        description: None,
    }
}

fn placeholder_table() -> TableRef {
    TableRef::new(CATALOG_PLACEHOLDER, SCHEMA_PLACEHOLDER, TABLE_PLACEHOLDER)
}

/// Template for one analytics domain, still carrying placeholders.
pub fn template(domain: &str) -> Result<SpaceConfig> {
    match domain {
        "minimal" => Ok(minimal()),
        "sales" => Ok(sales()),
        "customer" => Ok(customer()),
        "inventory" => Ok(inventory()),
        "financial" => Ok(financial()),
        "hr" => Ok(hr()),
        other => Err(GenieError::Validation(format!(
            "unknown template domain '{}'; available: {}",
            other,
            DOMAINS.join(", ")
        ))),
    }
}

/// Instantiate a domain template against real tables.
///
/// The table list replaces the template's placeholder table; placeholder
/// text inside instructions, examples, and snippets is substituted with the
/// first table's identifiers.
pub fn generate_from_template(
    domain: &str,
    catalog_name: &str,
    schema_name: &str,
    table_names: &[String],
    space_name: Option<String>,
    description: Option<String>,
) -> Result<SpaceConfig> {
    if table_names.is_empty() {
        return Err(GenieError::Validation(
            "at least one table name is required".to_string(),
        ));
    }

    let mut config = template(domain)?;

    config.space_name = space_name.unwrap_or_else(|| {
        format!("{} Space - {}", title_case(domain), schema_name)
    });
    if let Some(description) = description {
        config.description = description;
    }

    config.tables = table_names
        .iter()
        .map(|name| TableRef::new(catalog_name, schema_name, name))
        .collect();

    let first_table = table_names[0].as_str();
    let substitute = |text: &str| -> String {
        text.replace(CATALOG_PLACEHOLDER, catalog_name)
            .replace(SCHEMA_PLACEHOLDER, schema_name)
            .replace(TABLE_PLACEHOLDER, first_table)
            .replace(
                FULL_TABLE_PLACEHOLDER,
                &format!("{catalog_name}.{schema_name}.{first_table}"),
            )
    };

    config.description = substitute(&config.description);
    for instruction in &mut config.instructions {
        instruction.content = substitute(&instruction.content);
    }
    for example in &mut config.example_sql_queries {
        example.sql_query = substitute(&example.sql_query);
    }
    for snippet in config
        .sql_snippets
        .measures
        .iter_mut()
        .chain(config.sql_snippets.expressions.iter_mut())
        .chain(config.sql_snippets.filters.iter_mut())
    {
        snippet.sql = substitute(&snippet.sql);
    }

    Ok(config)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn minimal() -> SpaceConfig {
    SpaceConfig {
        space_name: "Quick Start Space".to_string(),
        description: "A minimal Genie space for [CATALOG].[SCHEMA].[TABLE_NAME]".to_string(),
        purpose: Some("Enable natural language queries on your data".to_string()),
        tables: vec![placeholder_table()],
        instructions: vec![instruction(
            "## Time Filtering\nDefault to last 30 days when no time range specified.",
            1,
        )],
        example_sql_queries: vec![example(
            "Show me recent records",
            "SELECT * FROM [CATALOG].[SCHEMA].[TABLE_NAME] LIMIT 100",
        )],
        ..Default::default()
    }
}

fn sales() -> SpaceConfig {
    SpaceConfig {
        space_name: "Sales Analytics".to_string(),
        description: "Natural language analytics for sales transactions and revenue data"
            .to_string(),
        purpose: Some(
            "Enable sales team to analyze revenue, transactions, and product performance"
                .to_string(),
        ),
        tables: vec![placeholder_table()],
        instructions: vec![
            instruction(
                "## Date Filtering\nUse `transaction_date` or `order_date` for time-based filtering. Default to last 7 days when not specified.",
                1,
            ),
            instruction(
                "## Revenue Calculations\nAlways cast revenue calculations to DECIMAL(38,2) for precision:\n- Example: `CAST(SUM(amount) AS DECIMAL(38,2))`\n- Use `try_divide()` to avoid division by zero",
                2,
            ),
            instruction(
                "## Top Products\nWhen showing top products:\n- Use `LIMIT 10` by default\n- Order by sales or revenue DESC\n- Include product name and total",
                3,
            ),
            instruction(
                "## Time Periods\nSupport common time periods:\n- Last 7 days: `>= CURRENT_DATE - 7`\n- Last 30 days: `>= CURRENT_DATE - 30`\n- This month: `>= DATE_TRUNC('MONTH', CURRENT_DATE)`\n- Last month: Use `DATE_SUB()` function",
                4,
            ),
        ],
        example_sql_queries: vec![
            example(
                "What were total sales last week?",
                "SELECT CAST(SUM(amount) AS DECIMAL(38,2)) as total_sales FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE transaction_date >= CURRENT_DATE - 7",
            ),
            example(
                "Top 10 products by revenue",
                "SELECT product_name, CAST(SUM(amount) AS DECIMAL(38,2)) as revenue FROM [CATALOG].[SCHEMA].[TABLE_NAME] GROUP BY product_name ORDER BY revenue DESC LIMIT 10",
            ),
            example(
                "Daily sales trend for the last 30 days",
                "SELECT DATE(transaction_date) as sale_date, CAST(SUM(amount) AS DECIMAL(38,2)) as daily_sales FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE transaction_date >= CURRENT_DATE - 30 GROUP BY DATE(transaction_date) ORDER BY sale_date",
            ),
        ],
        sql_snippets: SqlSnippets {
            measures: vec![SqlSnippet {
                display_name: "Total Revenue".to_string(),
                sql: "CAST(SUM(amount) AS DECIMAL(38,2))".to_string(),
                synonyms: vec![
                    "revenue".to_string(),
                    "sales".to_string(),
                    "total sales".to_string(),
                ],
                instruction: Some("Use for calculating total sales or revenue".to_string()),
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}

fn customer() -> SpaceConfig {
    SpaceConfig {
        space_name: "Customer Analytics".to_string(),
        description: "Natural language analytics for customer behavior and segmentation"
            .to_string(),
        purpose: Some(
            "Enable customer insights team to analyze user behavior, retention, and segmentation"
                .to_string(),
        ),
        tables: vec![placeholder_table()],
        instructions: vec![
            instruction(
                "## Customer Identification\nUse `customer_id` or `user_id` for unique customer identification.",
                1,
            ),
            instruction(
                "## Date Columns\nUse `signup_date` or `registration_date` for customer acquisition analysis.\nUse `last_activity_date` or `last_purchase_date` for engagement analysis.",
                2,
            ),
            instruction(
                "## Customer Counts\nAlways use `COUNT(DISTINCT customer_id)` when counting customers to avoid duplicates.",
                3,
            ),
            instruction(
                "## Segmentation\nCommon segments:\n- New customers: signed up in last 30 days\n- Active customers: activity in last 90 days\n- Churned customers: no activity in last 180 days",
                4,
            ),
        ],
        example_sql_queries: vec![
            example(
                "How many new customers signed up last month?",
                "SELECT COUNT(DISTINCT customer_id) as new_customers FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE signup_date >= DATE_TRUNC('MONTH', CURRENT_DATE - 30) AND signup_date < DATE_TRUNC('MONTH', CURRENT_DATE)",
            ),
            example(
                "What is the customer retention rate?",
                "SELECT COUNT(DISTINCT CASE WHEN last_activity_date >= CURRENT_DATE - 90 THEN customer_id END) * 100.0 / COUNT(DISTINCT customer_id) as retention_rate FROM [CATALOG].[SCHEMA].[TABLE_NAME]",
            ),
            example(
                "Top 10 customers by total purchases",
                "SELECT customer_id, COUNT(*) as purchase_count, CAST(SUM(purchase_amount) AS DECIMAL(38,2)) as total_spent FROM [CATALOG].[SCHEMA].[TABLE_NAME] GROUP BY customer_id ORDER BY total_spent DESC LIMIT 10",
            ),
        ],
        ..Default::default()
    }
}

fn inventory() -> SpaceConfig {
    SpaceConfig {
        space_name: "Inventory Management".to_string(),
        description: "Natural language analytics for inventory levels and warehouse operations"
            .to_string(),
        purpose: Some(
            "Enable operations team to track stock levels, warehouse capacity, and inventory movement"
                .to_string(),
        ),
        tables: vec![placeholder_table()],
        instructions: vec![
            instruction(
                "## Stock Levels\nUse `quantity_on_hand` or `stock_level` for current inventory.\nUse `reorder_point` to identify items needing restocking.",
                1,
            ),
            instruction(
                "## Warehouse Identification\nUse `warehouse_id` or `location_id` to filter by specific warehouses.",
                2,
            ),
            instruction(
                "## Low Stock Alerts\nDefine low stock as: `quantity_on_hand < reorder_point`\nDefine out of stock as: `quantity_on_hand = 0`",
                3,
            ),
            instruction(
                "## Inventory Value\nCalculate inventory value as: `quantity_on_hand * unit_cost`\nCast to DECIMAL(38,2) for precision.",
                4,
            ),
        ],
        example_sql_queries: vec![
            example(
                "Show me items with low stock",
                "SELECT product_id, product_name, quantity_on_hand, reorder_point FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE quantity_on_hand < reorder_point ORDER BY quantity_on_hand",
            ),
            example(
                "What is the total inventory value?",
                "SELECT CAST(SUM(quantity_on_hand * unit_cost) AS DECIMAL(38,2)) as total_value FROM [CATALOG].[SCHEMA].[TABLE_NAME]",
            ),
            example(
                "Which warehouse has the most inventory?",
                "SELECT warehouse_id, SUM(quantity_on_hand) as total_units FROM [CATALOG].[SCHEMA].[TABLE_NAME] GROUP BY warehouse_id ORDER BY total_units DESC LIMIT 1",
            ),
        ],
        ..Default::default()
    }
}

fn financial() -> SpaceConfig {
    SpaceConfig {
        space_name: "Financial Analytics".to_string(),
        description: "Natural language analytics for budgets, expenses, and financial reporting"
            .to_string(),
        purpose: Some(
            "Enable finance team to analyze spending, budgets, and P&L statements".to_string(),
        ),
        tables: vec![placeholder_table()],
        instructions: vec![
            instruction(
                "## Amount Calculations\nAlways cast financial amounts to DECIMAL(38,2) for precision.\nUse `try_divide()` for percentage calculations to avoid division by zero.",
                1,
            ),
            instruction(
                "## Date Columns\nUse `transaction_date` or `posting_date` for financial periods.\nDefault to current fiscal year when no period is specified.",
                2,
            ),
            instruction(
                "## Account Types\nRevenue accounts: typically positive amounts\nExpense accounts: typically positive amounts (not negative)\nUse `account_type` or `account_category` for classification.",
                3,
            ),
            instruction(
                "## Budget Variance\nCalculate variance as: `actual - budget`\nCalculate variance percentage as: `try_divide((actual - budget), budget) * 100`",
                4,
            ),
        ],
        example_sql_queries: vec![
            example(
                "What were total expenses last quarter?",
                "SELECT CAST(SUM(amount) AS DECIMAL(38,2)) as total_expenses FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE account_type = 'Expense' AND transaction_date >= DATE_TRUNC('QUARTER', CURRENT_DATE - 90) AND transaction_date < DATE_TRUNC('QUARTER', CURRENT_DATE)",
            ),
            example(
                "Show budget vs actual by department",
                "SELECT department, CAST(SUM(budget_amount) AS DECIMAL(38,2)) as budget, CAST(SUM(actual_amount) AS DECIMAL(38,2)) as actual, CAST(SUM(actual_amount - budget_amount) AS DECIMAL(38,2)) as variance FROM [CATALOG].[SCHEMA].[TABLE_NAME] GROUP BY department ORDER BY variance DESC",
            ),
            example(
                "Top 5 expense categories",
                "SELECT category, CAST(SUM(amount) AS DECIMAL(38,2)) as total_expense FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE account_type = 'Expense' GROUP BY category ORDER BY total_expense DESC LIMIT 5",
            ),
        ],
        ..Default::default()
    }
}

fn hr() -> SpaceConfig {
    SpaceConfig {
        space_name: "HR Analytics".to_string(),
        description: "Natural language analytics for headcount, compensation, and performance"
            .to_string(),
        purpose: Some(
            "Enable HR team to analyze employee data, compensation, and organizational metrics"
                .to_string(),
        ),
        tables: vec![placeholder_table()],
        instructions: vec![
            instruction(
                "## Employee Identification\nUse `employee_id` for unique employee identification.\nUse `is_active` or `employment_status = 'Active'` to filter current employees.",
                1,
            ),
            instruction(
                "## Date Columns\nUse `hire_date` for tenure calculations.\nUse `termination_date` for turnover analysis.\nUse `last_review_date` for performance tracking.",
                2,
            ),
            instruction(
                "## Compensation Calculations\nAlways cast salary amounts to DECIMAL(38,2).\nCalculate averages using AVG() function.\nConsider using COUNT(DISTINCT employee_id) for headcount.",
                3,
            ),
            instruction(
                "## Tenure Calculation\nCalculate years of service as: `DATEDIFF(CURRENT_DATE, hire_date) / 365.25`\nRound to two decimal places for reporting.",
                4,
            ),
        ],
        example_sql_queries: vec![
            example(
                "What is the current headcount by department?",
                "SELECT department, COUNT(DISTINCT employee_id) as headcount FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE is_active = true GROUP BY department ORDER BY headcount DESC",
            ),
            example(
                "What is the average salary by department?",
                "SELECT department, CAST(AVG(salary) AS DECIMAL(38,2)) as avg_salary FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE is_active = true GROUP BY department ORDER BY avg_salary DESC",
            ),
            example(
                "How many employees were hired in the last 6 months?",
                "SELECT COUNT(DISTINCT employee_id) as new_hires FROM [CATALOG].[SCHEMA].[TABLE_NAME] WHERE hire_date >= CURRENT_DATE - 180",
            ),
        ],
        ..Default::default()
    }
}

/// The configuration schema document served by the `get_config_schema` tool:
/// field reference, guidelines, scoring bands, a worked example, and the
/// recommended workflow.
pub fn config_schema() -> Value {
    json!({
        "title": "SpaceConfig",
        "description": "User-facing configuration for a Databricks Genie space",
        "type": "object",
        "required": ["space_name", "description", "tables"],
        "properties": {
            "space_name": {"type": "string", "description": "Display name for the space"},
            "description": {"type": "string", "description": "What the space is for"},
            "purpose": {"type": "string", "description": "Target audience and use cases"},
            "tables": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["catalog_name", "schema_name", "table_name"],
                    "properties": {
                        "catalog_name": {"type": "string"},
                        "schema_name": {"type": "string"},
                        "table_name": {"type": "string"},
                        "description": {"type": "string"}
                    }
                }
            },
            "instructions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["content"],
                    "properties": {
                        "content": {"type": "string", "description": "Markdown guidance for the model"},
                        "priority": {"type": "integer", "default": 1, "description": "1 is highest"}
                    }
                }
            },
            "sql_snippets": {
                "type": "object",
                "properties": {
                    "measures": {"$ref": "#/definitions/snippet_list", "description": "Aggregations, e.g. SUM(orders.amount)"},
                    "expressions": {"$ref": "#/definitions/snippet_list", "description": "Dimensions and calculated fields, e.g. YEAR(orders.order_date)"},
                    "filters": {"$ref": "#/definitions/snippet_list", "description": "WHERE conditions, e.g. table.price > 100"}
                }
            },
            "join_specifications": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["left_table", "right_table", "join_condition"],
                    "properties": {
                        "left_table": {"type": "string"},
                        "right_table": {"type": "string"},
                        "join_type": {"type": "string", "default": "INNER"},
                        "join_condition": {"type": "string"},
                        "description": {"type": "string"},
                        "instruction": {"type": "string"}
                    }
                }
            },
            "example_sql_queries": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["question", "sql_query"],
                    "properties": {
                        "question": {"type": "string"},
                        "sql_query": {"type": "string"},
                        "description": {"type": "string"}
                    }
                }
            },
            "benchmark_questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["question"],
                    "properties": {"question": {"type": "string"}}
                }
            }
        },
        "definitions": {
            "snippet_list": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["display_name", "sql"],
                    "properties": {
                        "display_name": {"type": "string"},
                        "sql": {"type": "string"},
                        "synonyms": {"type": "array", "items": {"type": "string"}},
                        "instruction": {"type": "string"}
                    }
                }
            }
        },
        "best_practices": {
            "instructions_do": [
                "Be specific: reference exact column names using backticks (e.g. `event_date`, `user_id`)",
                "Use markdown formatting: headers (##), bullet lists (-), bold (**important**)",
                "Provide context: explain when and how to use specific patterns",
                "Include examples: show concrete SQL patterns or values",
                "Set priorities: critical instructions should have priority=1"
            ],
            "instructions_dont": [
                "Avoid vague terms: 'appropriate', 'relevant', 'as needed'",
                "Don't be generic: 'Handle dates properly' -> 'Use `event_date` for filtering by date'",
                "Don't skip formatting: plain text is harder to parse"
            ],
            "sql": [
                "Use explicit JOINs with ON clauses (not comma-separated tables)",
                "Use date functions: CURRENT_DATE, DATE_SUB(), DATE_TRUNC()",
                "Add LIMIT clauses to prevent large result sets",
                "Cast aggregates to DECIMAL(38,2) for precision",
                "Use try_divide() to avoid division by zero"
            ]
        },
        "validation_rules": {
            "required_fields": ["space_name", "description", "tables (at least 1 table)"],
            "recommended_fields": {
                "instructions": "Highly recommended for score >80. Guidance on how to query the data.",
                "example_sql_queries": "Highly recommended for score >80. Example queries for common questions.",
                "sql_snippets": "Optional. Reusable filters, expressions, and measures.",
                "join_specifications": "Required when using multiple tables.",
                "benchmark_questions": "Optional. Used for testing space quality."
            },
            "quality_scoring": {
                "90-100": "Excellent - complete config with instructions, examples, and snippets",
                "80-89": "Good - has instructions and examples, may be missing snippets",
                "70-79": "Acceptable - basic config with tables and minimal guidance",
                "60-69": "Needs improvement - missing key fields or insufficient detail",
                "0-59": "Poor - incomplete or invalid configuration"
            }
        },
        "example": {
            "space_name": "Sales Analytics",
            "description": "Natural language analytics for sales transactions",
            "purpose": "Enable sales team to analyze revenue and product performance",
            "tables": [
                {"catalog_name": "main", "schema_name": "sales", "table_name": "orders"}
            ],
            "instructions": [
                {"content": "## Date Filtering\nUse `order_date` for time-based filtering.", "priority": 1}
            ],
            "example_sql_queries": [
                {
                    "question": "What were total sales last week?",
                    "sql_query": "SELECT CAST(SUM(amount) AS DECIMAL(38,2)) AS total FROM main.sales.orders WHERE order_date >= CURRENT_DATE - 7"
                }
            ]
        },
        "workflow": [
            "1. Get this schema with the get_config_schema tool",
            "2. Optionally start from a domain template with get_config_template",
            "3. Generate a config from the schema and the user's requirements",
            "4. Validate with validate_space_config",
            "5. Create the space with create_genie_space"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_config;

    #[test]
    fn every_domain_has_a_template() {
        for domain in DOMAINS {
            let config = template(domain).unwrap();
            assert!(!config.tables.is_empty(), "{domain} template has no tables");
            assert!(
                !config.instructions.is_empty(),
                "{domain} template has no instructions"
            );
            assert!(
                !config.example_sql_queries.is_empty(),
                "{domain} template has no examples"
            );
        }
        assert!(template("astrology").is_err());
    }

    #[test]
    fn instantiation_substitutes_placeholders_everywhere() {
        let config = generate_from_template(
            "sales",
            "main",
            "retail",
            &["orders".to_string(), "products".to_string()],
            None,
            None,
        )
        .unwrap();

        assert_eq!(config.space_name, "Sales Space - retail");
        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.tables[0].fully_qualified(), "main.retail.orders");
        assert_eq!(config.tables[1].fully_qualified(), "main.retail.products");

        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("[CATALOG]"), "placeholder leaked: {rendered}");
        assert!(!rendered.contains("[SCHEMA]"));
        assert!(!rendered.contains("[TABLE_NAME]"));
        assert!(config.example_sql_queries[0]
            .sql_query
            .contains("main.retail.orders"));
    }

    #[test]
    fn instantiation_honors_overrides() {
        let config = generate_from_template(
            "minimal",
            "main",
            "ops",
            &["events".to_string()],
            Some("Ops Events".to_string()),
            Some("Operational event analytics".to_string()),
        )
        .unwrap();
        assert_eq!(config.space_name, "Ops Events");
        assert_eq!(config.description, "Operational event analytics");
    }

    #[test]
    fn instantiation_requires_tables() {
        assert!(generate_from_template("minimal", "main", "ops", &[], None, None).is_err());
    }

    #[test]
    fn instantiated_templates_pass_validation() {
        for domain in DOMAINS {
            let config = generate_from_template(
                domain,
                "main",
                "analytics",
                &["facts".to_string()],
                None,
                None,
            )
            .unwrap();
            let report = validate_config(&config, true);
            assert!(report.valid, "{domain}: {:?}", report.errors);
            assert!(report.score >= 70, "{domain} scored {}", report.score);
        }
    }

    #[test]
    fn schema_document_names_the_required_fields() {
        let schema = config_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["space_name", "description", "tables"]);
        assert!(schema["workflow"].as_array().unwrap().len() >= 5);
    }
}
