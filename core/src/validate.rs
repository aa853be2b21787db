//! Configuration quality validation: completeness, lightweight SQL sanity
//! checks, and instruction quality. Produces a 0-100 score where the overall
//! score is the worst section, not an average.

use serde::Serialize;

use crate::model::SpaceConfig;

/// Instruction wording that gives the model nothing to work with.
const VAGUE_TERMS: [&str; 5] = ["appropriate", "relevant", "good", "properly", "as needed"];

/// Outcome of validating one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// 0-100; minimum of the section scores.
    pub score: u8,
}

impl ValidationReport {
    fn rejected(error: String) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            warnings: Vec::new(),
            score: 0,
        }
    }
}

/// Validate a JSON string as a space configuration.
pub fn validate_json(json: &str, validate_sql: bool) -> ValidationReport {
    let config: SpaceConfig = match serde_json::from_str(json) {
        Ok(config) => config,
        Err(e) => return ValidationReport::rejected(format!("invalid JSON: {e}")),
    };
    validate_config(&config, validate_sql)
}

/// Validate a parsed configuration.
///
/// Structural violations (no tables, duplicate tables, dangling joins) short
/// circuit with a zero score; they would be rejected before any network call
/// anyway. Everything else accumulates warnings and score deductions.
pub fn validate_config(config: &SpaceConfig, validate_sql: bool) -> ValidationReport {
    if let Err(e) = config.validate() {
        return ValidationReport::rejected(e.to_string());
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut score: i32 = 100;

    let completeness = check_completeness(config, &mut warnings);
    score = score.min(completeness);

    if validate_sql {
        let sql = check_sql_sections(config, &mut errors);
        score = score.min(sql);
    }

    let instructions = check_instruction_quality(config, &mut warnings);
    score = score.min(instructions);

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        score: score.clamp(0, 100) as u8,
    }
}

fn check_completeness(config: &SpaceConfig, warnings: &mut Vec<String>) -> i32 {
    let mut score: i32 = 100;

    if config.instructions.is_empty() {
        warnings.push("no instructions provided - consider adding guidance".to_string());
        score -= 10;
    }
    if config.example_sql_queries.is_empty() {
        warnings.push("no example SQL queries - consider adding examples".to_string());
        score -= 10;
    }
    if config.space_name.chars().count() < 5 {
        warnings.push("space name is very short - use a descriptive name".to_string());
        score -= 5;
    }
    if config.description.chars().count() < 20 {
        warnings.push("description is very short - provide more context".to_string());
        score -= 5;
    }

    score.max(0)
}

fn check_sql_sections(config: &SpaceConfig, errors: &mut Vec<String>) -> i32 {
    let mut score: i32 = 100;

    for (i, example) in config.example_sql_queries.iter().enumerate() {
        if let Err(reason) = check_sql(&example.sql_query) {
            errors.push(format!("example query #{} has invalid SQL: {}", i + 1, reason));
            score -= 15;
        }
    }

    for (i, filter) in config.sql_snippets.filters.iter().enumerate() {
        if let Err(reason) = check_sql(&filter.sql) {
            errors.push(format!("filter #{} has invalid SQL: {}", i + 1, reason));
            score -= 5;
        }
    }
    for expression in &config.sql_snippets.expressions {
        if let Err(reason) = check_sql(&expression.sql) {
            errors.push(format!(
                "expression '{}' has invalid SQL: {}",
                expression.display_name, reason
            ));
            score -= 5;
        }
    }
    for measure in &config.sql_snippets.measures {
        if let Err(reason) = check_sql(&measure.sql) {
            errors.push(format!(
                "measure '{}' has invalid SQL: {}",
                measure.display_name, reason
            ));
            score -= 5;
        }
    }

    score.max(0)
}

/// Cheap structural checks; this is not a SQL parser.
fn check_sql(sql: &str) -> std::result::Result<(), String> {
    if sql.trim().is_empty() {
        return Err("empty SQL".to_string());
    }
    if sql.matches('(').count() != sql.matches(')').count() {
        return Err("unbalanced parentheses".to_string());
    }
    let quotes = sql.matches('\'').count() - sql.matches("\\'").count();
    if quotes % 2 != 0 {
        return Err("unbalanced single quotes".to_string());
    }
    Ok(())
}

fn check_instruction_quality(config: &SpaceConfig, warnings: &mut Vec<String>) -> i32 {
    let mut score: i32 = 100;

    for (i, instruction) in config.instructions.iter().enumerate() {
        let lower = instruction.content.to_lowercase();

        let found: Vec<&str> = VAGUE_TERMS
            .iter()
            .copied()
            .filter(|term| lower.contains(term))
            .collect();
        if !found.is_empty() {
            warnings.push(format!(
                "instruction #{} contains vague terms: {}",
                i + 1,
                found.join(", ")
            ));
            score -= 5;
        }

        let word_count = instruction.content.split_whitespace().count();
        if word_count < 10 {
            warnings.push(format!(
                "instruction #{} is very short ({} words)",
                i + 1,
                word_count
            ));
            score -= 3;
        }

        if !instruction.content.contains('`') {
            warnings.push(format!(
                "instruction #{} lacks specific column/table references (use backticks)",
                i + 1
            ));
            score -= 3;
        }
    }

    score.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExampleQuery, Instruction, SqlSnippet, TableRef};

    fn rich_config() -> SpaceConfig {
        SpaceConfig {
            space_name: "Sales Analytics".to_string(),
            description: "Order and revenue analysis for the sales team".to_string(),
            tables: vec![TableRef::new("main", "sales", "orders")],
            instructions: vec![Instruction::new(
                "Always filter on the `order_date` column when the question mentions a time range",
            )],
            example_sql_queries: vec![ExampleQuery {
                question: "How many orders last month?".to_string(),
                sql_query: "SELECT COUNT(*) FROM main.sales.orders WHERE order_date >= '2024-01-01'"
                    .to_string(),
                description: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn rich_config_scores_full_marks() {
        let report = validate_config(&rich_config(), true);
        assert!(report.valid, "errors: {:?}", report.errors);
        assert_eq!(report.score, 100);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn structural_violations_zero_the_score() {
        let mut config = rich_config();
        config.tables.clear();
        let report = validate_config(&config, true);
        assert!(!report.valid);
        assert_eq!(report.score, 0);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn missing_sections_are_warnings_not_errors() {
        let config = SpaceConfig {
            space_name: "S".to_string(),
            description: "short".to_string(),
            tables: vec![TableRef::new("main", "sales", "orders")],
            ..Default::default()
        };
        let report = validate_config(&config, true);
        assert!(report.valid);
        // -10 instructions, -10 examples, -5 name, -5 description.
        assert_eq!(report.score, 70);
        assert_eq!(report.warnings.len(), 4);
    }

    #[test]
    fn unbalanced_sql_is_an_error() {
        let mut config = rich_config();
        config.example_sql_queries[0].sql_query =
            "SELECT COUNT(* FROM main.sales.orders".to_string();
        let report = validate_config(&config, true);
        assert!(!report.valid);
        assert_eq!(report.score, 85);
        assert!(report.errors[0].contains("unbalanced parentheses"));

        config.example_sql_queries[0].sql_query =
            "SELECT * FROM orders WHERE region = 'west".to_string();
        let report = validate_config(&config, true);
        assert!(!report.valid);
        assert!(report.errors[0].contains("unbalanced single quotes"));
    }

    #[test]
    fn sql_checks_can_be_skipped() {
        let mut config = rich_config();
        config.example_sql_queries[0].sql_query = "SELECT (".to_string();
        let report = validate_config(&config, false);
        assert!(report.valid);
    }

    #[test]
    fn escaped_quotes_balance() {
        assert!(check_sql("SELECT 'it\\'s fine' FROM t").is_ok());
        assert!(check_sql("SELECT 'unterminated FROM t").is_err());
    }

    #[test]
    fn vague_and_short_instructions_are_flagged() {
        let mut config = rich_config();
        config.instructions = vec![Instruction::new("Use appropriate filters")];
        let report = validate_config(&config, true);
        assert!(report.valid);
        // -5 vague, -3 short, -3 no backticks.
        assert_eq!(report.score, 89);
        assert!(report.warnings.iter().any(|w| w.contains("vague terms")));
    }

    #[test]
    fn snippet_sql_is_checked() {
        let mut config = rich_config();
        config.sql_snippets.measures.push(SqlSnippet {
            display_name: "total_revenue".to_string(),
            sql: "SUM(amount".to_string(),
            synonyms: vec![],
            instruction: None,
        });
        let report = validate_config(&config, true);
        assert!(!report.valid);
        assert_eq!(report.score, 95);
        assert!(report.errors[0].contains("total_revenue"));
    }

    #[test]
    fn invalid_json_is_rejected_outright() {
        let report = validate_json("{not json", true);
        assert!(!report.valid);
        assert_eq!(report.score, 0);
    }
}
