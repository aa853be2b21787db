//! Space health analysis: configuration quality scoring, activity scoring,
//! markdown health reports, config diffs, and search matchers.
//!
//! Everything here is pure; callers fetch and parse the configurations and
//! supply activity figures.

use std::collections::BTreeSet;

use crate::model::SpaceConfig;

/// Health score (0-100) with recommendations.
///
/// The score is a 60/40 blend: configuration quality contributes 60 points,
/// recent activity the remaining 40. `days_since_activity` is `None` when
/// the space has no recorded conversations.
pub fn health_score(
    config: &SpaceConfig,
    conversation_count: usize,
    days_since_activity: Option<i64>,
) -> (u8, Vec<String>) {
    let mut recommendations = Vec::new();

    let config_score = config_quality(config, &mut recommendations);
    let activity_score = activity_level(conversation_count, days_since_activity, &mut recommendations);

    let score = config_score * 6 / 10 + activity_score * 4 / 10;
    (score.clamp(0, 100) as u8, recommendations)
}

fn config_quality(config: &SpaceConfig, recommendations: &mut Vec<String>) -> i32 {
    let mut score: i32 = 100;

    let table_count = config.tables.len();
    if table_count == 0 {
        score -= 40;
        recommendations.push("❌ **Critical:** Add at least one table to the space".to_string());
    } else if table_count > 10 {
        score -= 10;
        recommendations.push("⚠️ Consider splitting into multiple spaces (10+ tables)".to_string());
    }

    let instruction_count = config.instructions.len();
    if instruction_count == 0 {
        score -= 20;
        recommendations.push("❌ **Critical:** Add instructions to guide Genie".to_string());
    } else if instruction_count < 5 {
        score -= 10;
        recommendations.push(format!(
            "⚠️ Add more instructions (current: {instruction_count}, recommend: 5+)"
        ));
    }

    let example_count = config.example_sql_queries.len();
    if example_count < 3 {
        score -= 15;
        recommendations.push(format!(
            "⚠️ Add example queries (current: {example_count}, recommend: 5+)"
        ));
    }

    if config.sql_snippets.measures.is_empty() && config.sql_snippets.expressions.is_empty() {
        score -= 15;
        recommendations
            .push("⚠️ Add SQL measures or expressions for common metrics".to_string());
    }

    if table_count > 1 && config.join_specifications.is_empty() {
        score -= 10;
        recommendations.push("⚠️ Define joins to connect tables".to_string());
    }

    score.max(0)
}

fn activity_level(
    conversation_count: usize,
    days_since_activity: Option<i64>,
    recommendations: &mut Vec<String>,
) -> i32 {
    let mut score: i32 = 100;

    if conversation_count == 0 {
        score -= 40;
        recommendations.push(
            "⚠️ No recent activity - consider adding example queries to encourage use".to_string(),
        );
    } else if conversation_count < 5 {
        score -= 20;
        recommendations.push(format!(
            "ℹ️ Low activity ({conversation_count} conversations in 30 days)"
        ));
    }

    if let Some(days) = days_since_activity {
        if days > 30 {
            score -= 30;
            recommendations.push(format!("⚠️ Inactive for {days} days"));
        } else if days > 7 {
            score -= 10;
            recommendations.push(format!("ℹ️ Last active {days} days ago"));
        }
    }

    score.max(0)
}

/// Full markdown health report for one space.
pub fn health_report(
    space_name: &str,
    config: &SpaceConfig,
    conversation_count: usize,
    days_since_activity: Option<i64>,
) -> String {
    let (score, recommendations) = health_score(config, conversation_count, days_since_activity);

    let mut output = format!("# 🏥 Space Health Report: {space_name}\n\n");
    output.push_str(&format!("## Overall Score: {score}/100\n\n"));

    let band = if score >= 90 {
        "✅ **Excellent** - Space is well-configured and active"
    } else if score >= 70 {
        "✅ **Good** - Space is functional with room for improvement"
    } else if score >= 50 {
        "⚠️ **Fair** - Space needs attention"
    } else {
        "❌ **Poor** - Space requires immediate attention"
    };
    output.push_str(band);
    output.push_str("\n\n");

    output.push_str("## Configuration Quality\n\n");
    output.push_str(&config_metrics(config));
    output.push('\n');

    output.push_str("## Activity\n\n");
    output.push_str(&activity_metrics(conversation_count, days_since_activity));
    output.push('\n');

    if !recommendations.is_empty() {
        output.push_str("## Recommendations\n\n");
        for recommendation in &recommendations {
            output.push_str(&format!("- {recommendation}\n"));
        }
        output.push('\n');
    }

    output.push_str("## Next Steps\n\n");
    output.push_str("- Export config: Use `/inspect` with mode='export'\n");
    output.push_str("- Update config: Use `/bulk` to add instructions/snippets\n");
    output.push_str("- Test queries: Use `/ask` to verify functionality\n");

    output
}

fn config_metrics(config: &SpaceConfig) -> String {
    let table_count = config.tables.len();
    let mut output = String::new();
    output.push_str(&metric_line("Tables", table_count, 1, Some(10)));
    output.push_str(&metric_line("Instructions", config.instructions.len(), 5, None));
    output.push_str(&metric_line(
        "Example Queries",
        config.example_sql_queries.len(),
        5,
        None,
    ));
    output.push_str(&metric_line(
        "SQL Measures",
        config.sql_snippets.measures.len(),
        1,
        None,
    ));
    output.push_str(&metric_line(
        "SQL Expressions",
        config.sql_snippets.expressions.len(),
        1,
        None,
    ));
    output.push_str(&metric_line(
        "SQL Filters",
        config.sql_snippets.filters.len(),
        0,
        None,
    ));
    if table_count > 1 {
        output.push_str(&metric_line(
            "Join Specifications",
            config.join_specifications.len(),
            table_count - 1,
            None,
        ));
    }
    output
}

fn metric_line(name: &str, value: usize, min_recommended: usize, max_recommended: Option<usize>) -> String {
    let mut icon = if value >= min_recommended { "✅" } else { "⚠️" };
    let note = match max_recommended {
        Some(max) if value > max => {
            icon = "⚠️";
            format!(" (recommend {min_recommended}-{max})")
        }
        _ if value < min_recommended => format!(" (recommend {min_recommended}+)"),
        _ => String::new(),
    };
    format!("{icon} **{name}:** {value}{note}\n")
}

fn activity_metrics(conversation_count: usize, days_since_activity: Option<i64>) -> String {
    let mut output = String::new();

    if conversation_count == 0 {
        output.push_str("⚠️ **Conversations:** No activity in last 30 days\n");
    } else if conversation_count < 5 {
        output.push_str(&format!(
            "ℹ️ **Conversations:** {conversation_count} in last 30 days (low activity)\n"
        ));
    } else {
        output.push_str(&format!(
            "✅ **Conversations:** {conversation_count} in last 30 days (active)\n"
        ));
    }

    match days_since_activity {
        Some(0) => output.push_str("✅ **Last Activity:** Today\n"),
        Some(1) => output.push_str("✅ **Last Activity:** Yesterday\n"),
        Some(days) if days < 7 => {
            output.push_str(&format!("✅ **Last Activity:** {days} days ago\n"))
        }
        Some(days) if days < 30 => {
            output.push_str(&format!("ℹ️ **Last Activity:** {days} days ago\n"))
        }
        Some(days) => output.push_str(&format!(
            "⚠️ **Last Activity:** {days} days ago (inactive)\n"
        )),
        None => output.push_str("ℹ️ **Last Activity:** Unknown\n"),
    }

    output
}

/// Markdown comparison of two configurations: a metric table plus the
/// table-set difference.
pub fn diff_report(
    left_name: &str,
    left_id: &str,
    left: &SpaceConfig,
    right_name: &str,
    right_id: &str,
    right: &SpaceConfig,
) -> String {
    let mut output = String::from("# 🔍 Configuration Diff\n\n");
    output.push_str(&format!("**Space 1:** {left_name} (`{left_id}`)\n"));
    output.push_str(&format!("**Space 2:** {right_name} (`{right_id}`)\n\n"));

    output.push_str("## Comparison\n\n");
    output.push_str("| Metric | Space 1 | Space 2 | Difference |\n");
    output.push_str("|--------|---------|---------|------------|\n");

    let rows: [(&str, usize, usize); 6] = [
        ("Tables", left.tables.len(), right.tables.len()),
        (
            "Instructions",
            left.instructions.len(),
            right.instructions.len(),
        ),
        (
            "Example Queries",
            left.example_sql_queries.len(),
            right.example_sql_queries.len(),
        ),
        (
            "SQL Measures",
            left.sql_snippets.measures.len(),
            right.sql_snippets.measures.len(),
        ),
        (
            "SQL Expressions",
            left.sql_snippets.expressions.len(),
            right.sql_snippets.expressions.len(),
        ),
        (
            "Join Specifications",
            left.join_specifications.len(),
            right.join_specifications.len(),
        ),
    ];
    for (name, a, b) in rows {
        let difference = b as i64 - a as i64;
        output.push_str(&format!("| {name} | {a} | {b} | {difference:+} |\n"));
    }
    output.push('\n');

    let left_tables: BTreeSet<String> =
        left.tables.iter().map(|t| t.fully_qualified()).collect();
    let right_tables: BTreeSet<String> =
        right.tables.iter().map(|t| t.fully_qualified()).collect();
    let only_left: Vec<&String> = left_tables.difference(&right_tables).collect();
    let only_right: Vec<&String> = right_tables.difference(&left_tables).collect();

    if !only_left.is_empty() || !only_right.is_empty() {
        output.push_str("## Table Differences\n\n");
        if !only_left.is_empty() {
            output.push_str("**Only in Space 1:**\n");
            for table in only_left {
                output.push_str(&format!("- {table}\n"));
            }
            output.push('\n');
        }
        if !only_right.is_empty() {
            output.push_str("**Only in Space 2:**\n");
            for table in only_right {
                output.push_str(&format!("- {table}\n"));
            }
            output.push('\n');
        }
    }

    output
}

/// Why a space matches a table search, if it does. Matching is
/// case-insensitive substring search over fully qualified table names.
pub fn table_match_reason(config: &SpaceConfig, search_tables: &[String]) -> Option<String> {
    for search in search_tables {
        let needle = search.to_lowercase();
        if config
            .tables
            .iter()
            .any(|t| t.fully_qualified().to_lowercase().contains(&needle))
        {
            return Some(format!("Contains table matching '{search}'"));
        }
    }
    None
}

/// Why a space matches a keyword search, if it does. Searches the space
/// name, description, and instruction text.
pub fn keyword_match_reason(
    space_name: &str,
    config: &SpaceConfig,
    keywords: &[String],
) -> Option<String> {
    let mut haystack = format!("{space_name} {}", config.description);
    for instruction in &config.instructions {
        haystack.push(' ');
        haystack.push_str(&instruction.content);
    }
    let haystack = haystack.to_lowercase();

    for keyword in keywords {
        if haystack.contains(&keyword.to_lowercase()) {
            return Some(format!("Contains keyword '{keyword}'"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExampleQuery, Instruction, SqlSnippet, TableRef};

    fn full_config() -> SpaceConfig {
        SpaceConfig {
            space_name: "Sales".to_string(),
            description: "Sales analytics for the retail team".to_string(),
            tables: vec![TableRef::new("main", "sales", "orders")],
            instructions: (0..5)
                .map(|i| Instruction::new(&format!("Use `col_{i}` when asked about {i}")))
                .collect(),
            example_sql_queries: (0..3)
                .map(|i| ExampleQuery {
                    question: format!("q{i}"),
                    sql_query: format!("SELECT {i}"),
                    description: None,
                })
                .collect(),
            sql_snippets: crate::model::SqlSnippets {
                measures: vec![SqlSnippet {
                    display_name: "Total".to_string(),
                    sql: "SUM(amount)".to_string(),
                    synonyms: vec![],
                    instruction: None,
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn perfect_config_and_activity_score_100() {
        let (score, recommendations) = health_score(&full_config(), 10, Some(2));
        assert_eq!(score, 100);
        assert!(recommendations.is_empty());
    }

    #[test]
    fn score_blends_sixty_forty() {
        // Perfect config, dead space: 60 + 40*0.3 = 72... activity with no
        // conversations is 100-40 = 60 -> 60*0.4 = 24; total 84.
        let (score, _) = health_score(&full_config(), 0, None);
        assert_eq!(score, 60 + 24);

        // Empty-ish config, active space: config 100-20-15-15 = 50 -> 30;
        // activity 100 -> 40; total 70.
        let sparse = SpaceConfig {
            space_name: "S".to_string(),
            tables: vec![TableRef::new("main", "a", "b")],
            ..Default::default()
        };
        let (score, recommendations) = health_score(&sparse, 10, Some(1));
        assert_eq!(score, 70);
        assert_eq!(recommendations.len(), 3);
    }

    #[test]
    fn staleness_penalizes_activity() {
        let (fresh, _) = health_score(&full_config(), 10, Some(3));
        let (aging, _) = health_score(&full_config(), 10, Some(10));
        let (stale, _) = health_score(&full_config(), 10, Some(45));
        assert!(fresh > aging && aging > stale);
        assert_eq!(fresh - aging, 4); // -10 on the 40% side
        assert_eq!(fresh - stale, 12); // -30 on the 40% side
    }

    #[test]
    fn report_carries_band_and_sections() {
        let report = health_report("Sales", &full_config(), 10, Some(0));
        assert!(report.contains("# 🏥 Space Health Report: Sales"));
        assert!(report.contains("## Overall Score: 100/100"));
        assert!(report.contains("**Excellent**"));
        assert!(report.contains("✅ **Last Activity:** Today"));
        assert!(report.contains("## Next Steps"));
        assert!(!report.contains("## Recommendations"));
    }

    #[test]
    fn poor_band_below_fifty() {
        let empty = SpaceConfig {
            tables: vec![],
            ..Default::default()
        };
        let report = health_report("Empty", &empty, 0, None);
        assert!(report.contains("**Poor**"), "{report}");
        assert!(report.contains("## Recommendations"));
    }

    #[test]
    fn diff_reports_metric_deltas_and_table_sets() {
        let left = full_config();
        let mut right = full_config();
        right.tables = vec![
            TableRef::new("main", "sales", "orders"),
            TableRef::new("main", "sales", "customers"),
        ];
        right.instructions.truncate(2);

        let report = diff_report("A", "id-a", &left, "B", "id-b", &right);
        assert!(report.contains("| Tables | 1 | 2 | +1 |"));
        assert!(report.contains("| Instructions | 5 | 2 | -3 |"));
        assert!(report.contains("**Only in Space 2:**"));
        assert!(report.contains("- main.sales.customers"));
        assert!(!report.contains("**Only in Space 1:**"));
    }

    #[test]
    fn search_matchers() {
        let config = full_config();
        assert_eq!(
            table_match_reason(&config, &["ORDERS".to_string()]),
            Some("Contains table matching 'ORDERS'".to_string())
        );
        assert!(table_match_reason(&config, &["payments".to_string()]).is_none());

        assert!(keyword_match_reason("Sales", &config, &["retail".to_string()]).is_some());
        assert!(keyword_match_reason("Sales", &config, &["col_2".to_string()]).is_some());
        assert!(keyword_match_reason("Sales", &config, &["aviation".to_string()]).is_none());
    }
}
