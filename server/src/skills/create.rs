//! Guided space creation skill: template generation, warehouse discovery,
//! validation scoring, and quick/guided/expert output modes.

use genie_core::warehouse::{self, Purpose};
use genie_core::{templates, validate, GenieService, SpaceConfig, ValidationReport};
use serde_json::Value;
use tracing::info;

use crate::error::McpResult;
use crate::skills::{arg_bool, arg_str, required_str};

/// Guided mode creates without further confirmation at or above this score.
const AUTO_CREATE_SCORE: u8 = 80;

/// Run the `create_space` skill.
///
/// Quick mode creates immediately; expert mode returns the config JSON for
/// manual editing; guided mode (the default) creates when the quality score
/// reaches [`AUTO_CREATE_SCORE`] and otherwise returns validation feedback.
pub async fn run(service: &GenieService, args: &Value) -> McpResult<String> {
    let catalog_name = required_str(args, "catalog_name")?;
    let schema_name = required_str(args, "schema_name")?;
    let table_names = required_str(args, "table_names")?;
    let warehouse_id = arg_str(args, "warehouse_id");
    let domain = arg_str(args, "domain").unwrap_or_else(|| "minimal".to_string());
    let space_name = arg_str(args, "space_name");
    let quick = arg_bool(args, "quick", false);
    let expert = arg_bool(args, "expert", false);

    let tables: Vec<String> = table_names
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tables.is_empty() {
        return Ok(
            "❌ **Error:** No tables specified. Provide at least one table name.".to_string(),
        );
    }

    // Warehouse discovery before anything else; nothing can be created
    // without one.
    let warehouses = match service.list_warehouses().await {
        Ok(warehouses) => warehouses,
        Err(err) => return Ok(format!("❌ **Error:** {err}")),
    };
    let (warehouse_id, warehouse_note) = match warehouse_id {
        Some(id) => match warehouses.iter().find(|w| w.id == id) {
            Some(warehouse) => (id.clone(), format!(" ({})", warehouse.name)),
            None => return Ok(format!("❌ **Error:** Warehouse ID '{id}' not found.")),
        },
        None => match warehouse::recommend(&warehouses, Purpose::Development) {
            Some(warehouse) => (
                warehouse.id.clone(),
                format!(" (auto-discovered: {})", warehouse.name),
            ),
            None => {
                return Ok("❌ **Error:** No SQL warehouses available.\n\n\
                     Please create a warehouse first or specify warehouse_id manually."
                    .to_string())
            }
        },
    };

    let config = match templates::generate_from_template(
        &domain,
        &catalog_name,
        &schema_name,
        &tables,
        space_name,
        None,
    ) {
        Ok(config) => config,
        Err(err) => return Ok(format!("❌ **Error generating config:** {err}")),
    };

    // SQL checks are skipped here: template SQL is trusted and the caller
    // can still run validate_space_config separately.
    let report = validate::validate_config(&config, false);
    let score = quality_score(&config, report.valid);
    let recommendations = improvement_recommendations(&config);

    if expert {
        return Ok(render_expert(
            &config,
            &report,
            score,
            &recommendations,
            &warehouse_id,
            &warehouse_note,
        ));
    }

    if quick || score >= AUTO_CREATE_SCORE {
        return Ok(create_space(
            service,
            &config,
            &report,
            score,
            &recommendations,
            &domain,
            &warehouse_id,
            &warehouse_note,
        )
        .await);
    }

    Ok(render_guided(
        &config,
        &report,
        score,
        &recommendations,
        &domain,
        &warehouse_id,
        &warehouse_note,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn create_space(
    service: &GenieService,
    config: &SpaceConfig,
    report: &ValidationReport,
    score: u8,
    recommendations: &[String],
    domain: &str,
    warehouse_id: &str,
    warehouse_note: &str,
) -> String {
    let space = match service
        .create_space_from_config(config, warehouse_id, None, None, None)
        .await
    {
        Ok(space) => space,
        Err(err) => return format!("❌ **Error creating space:** {err}"),
    };
    info!(target: "create_skill", space_id = %space.space_id, "space created via skill");

    let mut output = String::from("# ✅ Space Created Successfully\n\n");
    output.push_str(&format!("**Space ID:** `{}`\n", space.space_id));
    output.push_str(&format!("**Space Name:** {}\n", config.space_name));
    output.push_str(&format!("**Warehouse:** `{warehouse_id}`{warehouse_note}\n"));
    output.push_str(&format!("**Validation Score:** {score}/100\n\n"));

    output.push_str("## Configuration\n\n");
    output.push_str(&format!("- **Domain:** {domain}\n"));
    output.push_str(&format!("- **Tables:** {}\n", config.tables.len()));
    output.push_str(&format!(
        "- **Instructions:** {}\n",
        config.instructions.len()
    ));
    output.push_str(&format!(
        "- **Example Queries:** {}\n",
        config.example_sql_queries.len()
    ));
    let snippets = &config.sql_snippets;
    if !snippets.measures.is_empty()
        || !snippets.expressions.is_empty()
        || !snippets.filters.is_empty()
    {
        output.push_str(&format!("- **SQL Measures:** {}\n", snippets.measures.len()));
        output.push_str(&format!(
            "- **SQL Expressions:** {}\n",
            snippets.expressions.len()
        ));
        output.push_str(&format!("- **SQL Filters:** {}\n", snippets.filters.len()));
    }
    if !config.join_specifications.is_empty() {
        output.push_str(&format!(
            "- **Join Specifications:** {}\n",
            config.join_specifications.len()
        ));
    }
    output.push('\n');

    if !report.warnings.is_empty() {
        output.push_str("## Warnings\n\n");
        for warning in &report.warnings {
            output.push_str(&format!("⚠️ {warning}\n"));
        }
        output.push('\n');
    }

    if !recommendations.is_empty() {
        output.push_str("## Recommendations\n\n");
        for recommendation in recommendations {
            output.push_str(&format!("- {recommendation}\n"));
        }
        output.push('\n');
    }

    output.push_str("## Next Steps\n\n");
    output.push_str(&format!(
        "1. **Ask questions:** Use `/ask` with space_id=`{}`\n",
        space.space_id
    ));
    output.push_str("2. **View in UI:** Open Genie Spaces in your Databricks workspace\n");
    output.push_str(&format!(
        "3. **Inspect health:** Use `/inspect` with space_id=`{}`\n",
        space.space_id
    ));
    output.push_str("4. **Update config:** Use `/bulk` to add more instructions or snippets\n");

    output
}

fn render_expert(
    config: &SpaceConfig,
    report: &ValidationReport,
    score: u8,
    recommendations: &[String],
    warehouse_id: &str,
    warehouse_note: &str,
) -> String {
    let mut output = String::from("# 🔧 Expert Mode: Review Configuration\n\n");
    output.push_str(&format!("**Warehouse:** `{warehouse_id}`{warehouse_note}\n"));
    output.push_str(&format!("**Validation Score:** {score}/100\n\n"));

    if !report.valid {
        output.push_str("⚠️ **Validation Errors:**\n\n");
        for error in &report.errors {
            output.push_str(&format!("- {error}\n"));
        }
        output.push('\n');
    }

    if !recommendations.is_empty() {
        output.push_str("**Recommendations:**\n\n");
        for recommendation in recommendations {
            output.push_str(&format!("- {recommendation}\n"));
        }
        output.push('\n');
    }

    output.push_str("## Configuration JSON\n\n");
    output.push_str(
        "Review and edit the configuration below, then use the `create_genie_space` tool directly:\n\n",
    );
    output.push_str("```json\n");
    output.push_str(&serde_json::to_string_pretty(config).unwrap_or_default());
    output.push_str("\n```\n\n");

    output.push_str("## Create Space\n\n");
    output.push_str("To create the space with this configuration:\n\n");
    output.push_str("```\n");
    output.push_str(&format!(
        "create_genie_space(\n    warehouse_id='{warehouse_id}',\n    config_json=<your_modified_config>\n)\n"
    ));
    output.push_str("```\n");

    output
}

fn render_guided(
    config: &SpaceConfig,
    report: &ValidationReport,
    score: u8,
    recommendations: &[String],
    domain: &str,
    warehouse_id: &str,
    warehouse_note: &str,
) -> String {
    let mut output = String::from("# 🔍 Guided Mode: Configuration Review\n\n");
    output.push_str(&format!("**Warehouse:** `{warehouse_id}`{warehouse_note}\n"));
    output.push_str(&format!("**Validation Score:** {score}/100\n\n"));

    let band = if score >= 90 {
        "✅ **Excellent** - Configuration is ready to use"
    } else if score >= 70 {
        "✅ **Good** - Configuration is functional"
    } else if score >= 50 {
        "⚠️ **Fair** - Configuration needs improvement"
    } else {
        "❌ **Poor** - Configuration has significant issues"
    };
    output.push_str(band);
    output.push_str("\n\n");

    if !report.valid {
        output.push_str("## Validation Errors\n\n");
        for error in &report.errors {
            output.push_str(&format!("❌ {error}\n"));
        }
        output.push('\n');
    }

    if !report.warnings.is_empty() {
        output.push_str("## Warnings\n\n");
        for warning in &report.warnings {
            output.push_str(&format!("⚠️ {warning}\n"));
        }
        output.push('\n');
    }

    if !recommendations.is_empty() {
        output.push_str("## Recommendations\n\n");
        for recommendation in recommendations {
            output.push_str(&format!("- {recommendation}\n"));
        }
        output.push('\n');
    }

    output.push_str("## Configuration Summary\n\n");
    output.push_str(&format!("- **Space Name:** {}\n", config.space_name));
    output.push_str(&format!("- **Domain:** {domain}\n"));
    output.push_str(&format!("- **Tables:** {}\n", config.tables.len()));
    output.push_str(&format!(
        "- **Instructions:** {}\n",
        config.instructions.len()
    ));
    output.push_str(&format!(
        "- **Example Queries:** {}\n\n",
        config.example_sql_queries.len()
    ));

    output.push_str("## Next Steps\n\n");
    output.push_str("**Option 1: Create with current config**\n");
    output.push_str("- Use `quick=true` to create immediately\n\n");
    output.push_str("**Option 2: Edit config manually**\n");
    output.push_str("- Use `expert=true` to get the full config JSON\n");
    output.push_str("- Edit and use `create_genie_space` tool directly\n\n");
    output.push_str("**Option 3: Improve config**\n");
    output.push_str("- Address the recommendations above\n");
    output.push_str("- Try a different domain template\n");

    output
}

/// Quality score (0-100) a configuration earns before creation; distinct
/// from the validator's section scoring.
fn quality_score(config: &SpaceConfig, valid: bool) -> u8 {
    let mut score: i32 = 100;

    if !valid {
        score -= 40;
    }

    let table_count = config.tables.len();
    if table_count == 0 {
        score -= 30;
    } else if table_count > 10 {
        score -= 5;
    }

    let instruction_count = config.instructions.len();
    if instruction_count < 3 {
        score -= 15;
    } else if instruction_count < 5 {
        score -= 5;
    }

    let example_count = config.example_sql_queries.len();
    if example_count < 3 {
        score -= 10;
    } else if example_count < 5 {
        score -= 5;
    }

    if config.sql_snippets.measures.is_empty() && config.sql_snippets.expressions.is_empty() {
        score -= 10;
    }

    if table_count > 1 {
        let join_count = config.join_specifications.len();
        if join_count == 0 {
            score -= 10;
        } else if join_count < table_count - 1 {
            score -= 5;
        }
    }

    score.clamp(0, 100) as u8
}

fn improvement_recommendations(config: &SpaceConfig) -> Vec<String> {
    let mut recommendations = Vec::new();

    let table_count = config.tables.len();
    if table_count == 0 {
        recommendations.push("Add at least one table to the space".to_string());
    } else if table_count > 10 {
        recommendations.push(
            "Consider splitting into multiple spaces (10+ tables can be confusing)".to_string(),
        );
    }

    let instruction_count = config.instructions.len();
    if instruction_count < 5 {
        recommendations.push(format!(
            "Add more instructions to guide Genie (current: {instruction_count}, recommend: 5+)"
        ));
    }

    let example_count = config.example_sql_queries.len();
    if example_count < 5 {
        recommendations.push(format!(
            "Add more example queries (current: {example_count}, recommend: 5+)"
        ));
    }

    if config.sql_snippets.measures.is_empty() {
        recommendations.push(
            "Add SQL measures for common metrics (e.g., revenue, count, average)".to_string(),
        );
    }
    if config.sql_snippets.expressions.is_empty() {
        recommendations.push(
            "Add SQL expressions for common dimensions (e.g., date parts, categories)".to_string(),
        );
    }

    if table_count > 1 {
        let join_count = config.join_specifications.len();
        if join_count == 0 {
            recommendations.push("Define join specifications to connect tables".to_string());
        } else if join_count < table_count - 1 {
            recommendations.push("Add more joins to fully connect all tables".to_string());
        }
    }

    recommendations
}
