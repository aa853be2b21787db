//! Bidirectional transformer between [`SpaceConfig`] and the platform's
//! versioned wire format.
//!
//! The forward direction is deterministic apart from generated entry IDs and
//! fails closed on invalid input or an unsupported target version. The
//! reverse direction is best-effort: it returns the reconstructed config
//! together with warnings for everything it could not map cleanly.

use std::collections::HashSet;

use crate::error::{GenieError, Result};
use crate::model::{
    BenchmarkQuestion, ExampleQuery, Instruction, JoinSpec, SpaceConfig, SqlSnippet, SqlSnippets,
    TableRef, WireDataSources, WireInstructions, WireQuestionConfig, WireSampleQuestion,
    WireSpace, WireTable, WireTextInstruction, WIRE_VERSION,
};

// Section markers are a stable internal convention: changing them breaks
// `from_wire` on spaces written by earlier builds.
const SECTION_BUSINESS_CONTEXT: &str = "BUSINESS CONTEXT:";
const SECTION_INSTRUCTIONS: &str = "INSTRUCTIONS:";
const SECTION_DATA_SOURCES: &str = "DATA SOURCES:";
const SECTION_RELATIONSHIPS: &str = "TABLE RELATIONSHIPS:";
const SECTION_MEASURES: &str = "MEASURES (Aggregations):";
const SECTION_EXPRESSIONS: &str = "EXPRESSIONS (Dimensions/Calculated Fields):";
const SECTION_FILTERS: &str = "FILTERS (WHERE Conditions):";
const SECTION_EXAMPLES: &str = "EXAMPLE QUERIES:";

/// Convert a user configuration to the wire format at [`WIRE_VERSION`].
pub fn to_wire(config: &SpaceConfig) -> Result<WireSpace> {
    to_wire_versioned(config, WIRE_VERSION)
}

/// Convert to a specific target version. Any version other than
/// [`WIRE_VERSION`] is refused rather than guessed at.
pub fn to_wire_versioned(config: &SpaceConfig, version: u32) -> Result<WireSpace> {
    if version != WIRE_VERSION {
        return Err(GenieError::Validation(format!(
            "unsupported wire version {} (this transformer emits version {})",
            version, WIRE_VERSION
        )));
    }
    config.validate()?;

    let tables = config
        .tables
        .iter()
        .map(|table| WireTable {
            identifier: table.fully_qualified(),
        })
        .collect();

    // Examples first, then benchmarks; each gets a fresh id.
    let mut sample_questions = Vec::new();
    for example in &config.example_sql_queries {
        sample_questions.push(WireSampleQuestion {
            id: WireSpace::new_id(),
            question: vec![example.question.clone()],
        });
    }
    for benchmark in &config.benchmark_questions {
        sample_questions.push(WireSampleQuestion {
            id: WireSpace::new_id(),
            question: vec![benchmark.question.clone()],
        });
    }

    let content = render_instruction_lines(config);
    let text_instructions = if content.is_empty() {
        Vec::new()
    } else {
        vec![WireTextInstruction {
            id: WireSpace::new_id(),
            content,
        }]
    };

    Ok(WireSpace {
        version,
        config: WireQuestionConfig { sample_questions },
        data_sources: WireDataSources { tables },
        instructions: WireInstructions { text_instructions },
    })
}

/// Serialize a config straight to the `serialized_space` JSON string.
pub fn to_wire_json(config: &SpaceConfig) -> Result<String> {
    to_wire(config)?.to_json()
}

/// Render every populated config field into section-segmented lines.
/// Fields with no content produce no header.
fn render_instruction_lines(config: &SpaceConfig) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    let purpose = config.purpose.as_deref().filter(|p| !p.is_empty());
    if !config.description.is_empty() || purpose.is_some() {
        lines.push(format!("{}\n", SECTION_BUSINESS_CONTEXT));
        if !config.description.is_empty() {
            lines.push(format!("{}\n", config.description));
        }
        if let Some(purpose) = purpose {
            lines.push(format!("Purpose: {}\n", purpose));
        }
        lines.push("\n".to_string());
    }

    if !config.instructions.is_empty() {
        lines.push(format!("{}\n", SECTION_INSTRUCTIONS));
        for (idx, instruction) in config.instructions.iter().enumerate() {
            let priority_marker = if instruction.priority != 0 {
                format!(" [Priority: {}]", instruction.priority)
            } else {
                String::new()
            };
            lines.push(format!(
                "{}. {}{}\n",
                idx + 1,
                instruction.content,
                priority_marker
            ));
        }
        lines.push("\n".to_string());
    }

    if !config.tables.is_empty() {
        lines.push(format!("{}\n", SECTION_DATA_SOURCES));
        for table in &config.tables {
            match table.description.as_deref().filter(|d| !d.is_empty()) {
                Some(description) => lines.push(format!(
                    "- {} - {}\n",
                    table.fully_qualified(),
                    description
                )),
                None => lines.push(format!("- {}\n", table.fully_qualified())),
            }
        }
        lines.push("\n".to_string());
    }

    if !config.join_specifications.is_empty() {
        lines.push(format!("{}\n", SECTION_RELATIONSHIPS));
        for join in &config.join_specifications {
            lines.push(format!(
                "- {} {} JOIN {}\n",
                join.left_table, join.join_type, join.right_table
            ));
            lines.push(format!("  ON {}\n", join.join_condition));
            if let Some(description) = join.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(format!("  Description: {}\n", description));
            }
            if let Some(instruction) = join.instruction.as_deref().filter(|i| !i.is_empty()) {
                lines.push(format!("  Usage: {}\n", instruction));
            }
        }
        lines.push("\n".to_string());
    }

    render_snippet_section(&mut lines, SECTION_MEASURES, &config.sql_snippets.measures);
    render_snippet_section(
        &mut lines,
        SECTION_EXPRESSIONS,
        &config.sql_snippets.expressions,
    );
    render_snippet_section(&mut lines, SECTION_FILTERS, &config.sql_snippets.filters);

    if !config.example_sql_queries.is_empty() {
        lines.push(format!("{}\n", SECTION_EXAMPLES));
        for (idx, example) in config.example_sql_queries.iter().enumerate() {
            lines.push(format!("{}. Question: {}\n", idx + 1, example.question));
            lines.push(format!("   SQL: {}\n", example.sql_query));
            if let Some(note) = example.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(format!("   Note: {}\n", note));
            }
        }
        lines.push("\n".to_string());
    }

    lines
}

fn render_snippet_section(lines: &mut Vec<String>, header: &str, snippets: &[SqlSnippet]) {
    if snippets.is_empty() {
        return;
    }
    lines.push(format!("{}\n", header));
    for snippet in snippets {
        let synonyms = if snippet.synonyms.is_empty() {
            String::new()
        } else {
            format!(" (Synonyms: {})", snippet.synonyms.join(", "))
        };
        lines.push(format!("- {}{}\n", snippet.display_name, synonyms));
        lines.push(format!("  SQL: {}\n", snippet.sql));
        if let Some(instruction) = snippet.instruction.as_deref().filter(|i| !i.is_empty()) {
            lines.push(format!("  Usage: {}\n", instruction));
        }
    }
    lines.push("\n".to_string());
}

/// Reconstruct a user configuration from the wire format.
///
/// Never fails: everything that cannot be mapped cleanly is either bucketed
/// into the nearest field or preserved as a plain instruction, and reported
/// in the returned warnings.
pub fn from_wire(wire: &WireSpace) -> (SpaceConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if wire.version != WIRE_VERSION {
        warnings.push(format!(
            "wire version {} differs from the supported version {}; parsed best-effort",
            wire.version, WIRE_VERSION
        ));
    }

    let mut tables = Vec::new();
    for wire_table in &wire.data_sources.tables {
        match TableRef::parse(&wire_table.identifier) {
            Some(table) => tables.push(table),
            None => warnings.push(format!(
                "skipped table identifier '{}' (expected catalog.schema.table)",
                wire_table.identifier
            )),
        }
    }

    let mut parsed = ParsedSections::default();
    for text_instruction in &wire.instructions.text_instructions {
        parse_sections(&text_instruction.joined(), &mut parsed, &mut warnings);
    }

    for (identifier, description) in &parsed.table_descriptions {
        if let Some(table) = tables
            .iter_mut()
            .find(|table| table.fully_qualified() == *identifier)
        {
            table.description = Some(description.clone());
        }
    }

    // Sample questions recovered as example queries in the EXAMPLE QUERIES
    // section keep their SQL; the rest come back as benchmark questions,
    // which is where question-only entries originate.
    let example_questions: HashSet<&str> = parsed
        .examples
        .iter()
        .map(|example| example.question.as_str())
        .collect();
    let mut benchmark_questions = Vec::new();
    for sample in &wire.config.sample_questions {
        match sample.question.first() {
            Some(first) if !example_questions.contains(first.as_str()) => {
                benchmark_questions.push(BenchmarkQuestion {
                    question: first.clone(),
                });
            }
            Some(_) => {}
            None => warnings.push(format!("sample question '{}' has no text; skipped", sample.id)),
        }
    }

    let config = SpaceConfig {
        space_name: "Imported Space".to_string(),
        description: parsed
            .description_lines
            .join("\n")
            .trim()
            .to_string(),
        purpose: parsed.purpose,
        tables,
        instructions: parsed.instructions,
        sql_snippets: parsed.snippets,
        join_specifications: parsed.joins,
        example_sql_queries: parsed.examples,
        benchmark_questions,
    };
    (config, warnings)
}

/// Parse the `serialized_space` JSON string directly.
pub fn from_wire_json(json: &str) -> Result<(SpaceConfig, Vec<String>)> {
    let wire = WireSpace::from_json(json)?;
    Ok(from_wire(&wire))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    BusinessContext,
    Instructions,
    DataSources,
    Relationships,
    Measures,
    Expressions,
    Filters,
    Examples,
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnippetKind {
    Measure,
    Expression,
    Filter,
}

#[derive(Default)]
struct ParsedSections {
    description_lines: Vec<String>,
    purpose: Option<String>,
    instructions: Vec<Instruction>,
    table_descriptions: Vec<(String, String)>,
    joins: Vec<JoinSpec>,
    snippets: SqlSnippets,
    examples: Vec<ExampleQuery>,
}

impl ParsedSections {
    fn push_snippet(&mut self, kind: SnippetKind, snippet: SqlSnippet) {
        match kind {
            SnippetKind::Measure => self.snippets.measures.push(snippet),
            SnippetKind::Expression => self.snippets.expressions.push(snippet),
            SnippetKind::Filter => self.snippets.filters.push(snippet),
        }
    }
}

fn section_for_header(line: &str) -> Option<Section> {
    match line {
        _ if line == SECTION_BUSINESS_CONTEXT => Some(Section::BusinessContext),
        _ if line == SECTION_INSTRUCTIONS => Some(Section::Instructions),
        _ if line == SECTION_DATA_SOURCES => Some(Section::DataSources),
        _ if line == SECTION_RELATIONSHIPS => Some(Section::Relationships),
        _ if line == SECTION_MEASURES => Some(Section::Measures),
        _ if line == SECTION_EXPRESSIONS => Some(Section::Expressions),
        _ if line == SECTION_FILTERS => Some(Section::Filters),
        _ if line == SECTION_EXAMPLES => Some(Section::Examples),
        _ => None,
    }
}

/// A line that looks like a section header this parser does not know:
/// ends with a colon and its leading alphabetic run is uppercase.
fn looks_like_unknown_header(line: &str) -> bool {
    if !line.ends_with(':') || line.starts_with('-') || line.starts_with(' ') {
        return false;
    }
    let leading: String = line.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    leading.len() >= 2 && leading.chars().all(|c| c.is_ascii_uppercase())
}

fn parse_sections(text: &str, out: &mut ParsedSections, warnings: &mut Vec<String>) {
    let mut section = Section::None;
    let mut unrecognized: Vec<String> = Vec::new();
    let mut current_join: Option<JoinSpec> = None;
    let mut current_snippet: Option<(SnippetKind, SqlSnippet)> = None;
    let mut current_example: Option<ExampleQuery> = None;

    let mut flush = |out: &mut ParsedSections,
                     join: &mut Option<JoinSpec>,
                     snippet: &mut Option<(SnippetKind, SqlSnippet)>,
                     example: &mut Option<ExampleQuery>| {
        if let Some(join) = join.take() {
            out.joins.push(join);
        }
        if let Some((kind, snippet)) = snippet.take() {
            out.push_snippet(kind, snippet);
        }
        if let Some(example) = example.take() {
            out.examples.push(example);
        }
    };

    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(next) = section_for_header(line) {
            flush(out, &mut current_join, &mut current_snippet, &mut current_example);
            section = next;
            continue;
        }
        if section != Section::Unrecognized && looks_like_unknown_header(line) {
            flush(out, &mut current_join, &mut current_snippet, &mut current_example);
            warnings.push(format!(
                "unrecognized section '{}' preserved as a plain instruction",
                line.trim_end_matches(':')
            ));
            section = Section::Unrecognized;
            unrecognized.push(line.to_string());
            continue;
        }

        match section {
            Section::None => {
                if unrecognized.is_empty() {
                    warnings.push(
                        "content outside any recognized section preserved as a plain instruction"
                            .to_string(),
                    );
                }
                unrecognized.push(line.to_string());
            }
            Section::Unrecognized => unrecognized.push(line.to_string()),
            Section::BusinessContext => match line.strip_prefix("Purpose: ") {
                Some(purpose) => out.purpose = Some(purpose.to_string()),
                None => out.description_lines.push(line.to_string()),
            },
            Section::Instructions => out.instructions.push(parse_instruction_line(line)),
            Section::DataSources => {
                if let Some(entry) = line.strip_prefix("- ") {
                    if let Some((identifier, description)) = entry.split_once(" - ") {
                        out.table_descriptions
                            .push((identifier.to_string(), description.to_string()));
                    }
                    // A bare identifier carries nothing beyond the
                    // authoritative data_sources list.
                }
            }
            Section::Relationships => {
                parse_relationship_line(line, &mut current_join, out, warnings)
            }
            Section::Measures => {
                parse_snippet_line(line, SnippetKind::Measure, &mut current_snippet, out)
            }
            Section::Expressions => {
                parse_snippet_line(line, SnippetKind::Expression, &mut current_snippet, out)
            }
            Section::Filters => {
                parse_snippet_line(line, SnippetKind::Filter, &mut current_snippet, out)
            }
            Section::Examples => parse_example_line(line, &mut current_example, out),
        }
    }

    flush(out, &mut current_join, &mut current_snippet, &mut current_example);

    if !unrecognized.is_empty() {
        out.instructions.push(Instruction::new(&unrecognized.join("\n")));
    }
}

/// `"3. Use fiscal year [Priority: 2]"` → content + priority.
fn parse_instruction_line(line: &str) -> Instruction {
    let body = match line.split_once(". ") {
        Some((number, rest)) if number.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => line,
    };

    if let Some(start) = body.rfind(" [Priority: ") {
        if let Some(digits) = body[start..]
            .strip_prefix(" [Priority: ")
            .and_then(|s| s.strip_suffix(']'))
        {
            if let Ok(priority) = digits.parse::<i32>() {
                return Instruction {
                    content: body[..start].to_string(),
                    priority,
                };
            }
        }
    }
    Instruction::new(body)
}

fn parse_relationship_line(
    line: &str,
    current: &mut Option<JoinSpec>,
    out: &mut ParsedSections,
    warnings: &mut Vec<String>,
) {
    if let Some(head) = line.strip_prefix("- ") {
        if let Some(join) = current.take() {
            out.joins.push(join);
        }
        match head.split_once(" JOIN ") {
            Some((left_and_type, right)) => {
                let mut parts = left_and_type.split_whitespace();
                let left = parts.next().unwrap_or_default().to_string();
                let join_type = parts.collect::<Vec<_>>().join(" ");
                *current = Some(JoinSpec {
                    left_table: left,
                    right_table: right.trim().to_string(),
                    join_type: if join_type.is_empty() {
                        "INNER".to_string()
                    } else {
                        join_type
                    },
                    join_condition: String::new(),
                    description: None,
                    instruction: None,
                });
            }
            None => warnings.push(format!("unparseable relationship entry '{}'; skipped", head)),
        }
        return;
    }

    let detail = line.trim_start();
    if let Some(join) = current.as_mut() {
        if let Some(condition) = detail.strip_prefix("ON ") {
            join.join_condition = condition.to_string();
        } else if let Some(description) = detail.strip_prefix("Description: ") {
            join.description = Some(description.to_string());
        } else if let Some(instruction) = detail.strip_prefix("Usage: ") {
            join.instruction = Some(instruction.to_string());
        }
    }
}

fn parse_snippet_line(
    line: &str,
    kind: SnippetKind,
    current: &mut Option<(SnippetKind, SqlSnippet)>,
    out: &mut ParsedSections,
) {
    if let Some(head) = line.strip_prefix("- ") {
        if let Some((kind, snippet)) = current.take() {
            out.push_snippet(kind, snippet);
        }
        let (name, synonyms) = match head.rfind(" (Synonyms: ") {
            Some(start) if head.ends_with(')') => {
                let list = &head[start + " (Synonyms: ".len()..head.len() - 1];
                (
                    head[..start].to_string(),
                    list.split(", ").map(|s| s.to_string()).collect(),
                )
            }
            _ => (head.to_string(), Vec::new()),
        };
        *current = Some((
            kind,
            SqlSnippet {
                display_name: name,
                sql: String::new(),
                synonyms,
                instruction: None,
            },
        ));
        return;
    }

    let detail = line.trim_start();
    if let Some((_, snippet)) = current.as_mut() {
        if let Some(sql) = detail.strip_prefix("SQL: ") {
            snippet.sql = sql.to_string();
        } else if let Some(instruction) = detail.strip_prefix("Usage: ") {
            snippet.instruction = Some(instruction.to_string());
        }
    }
}

fn parse_example_line(
    line: &str,
    current: &mut Option<ExampleQuery>,
    out: &mut ParsedSections,
) {
    let body = match line.split_once(". ") {
        Some((number, rest)) if number.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => line.trim_start(),
    };

    if let Some(question) = body.strip_prefix("Question: ") {
        if let Some(example) = current.take() {
            out.examples.push(example);
        }
        *current = Some(ExampleQuery {
            question: question.to_string(),
            sql_query: String::new(),
            description: None,
        });
        return;
    }

    if let Some(example) = current.as_mut() {
        if let Some(sql) = body.strip_prefix("SQL: ") {
            example.sql_query = sql.to_string();
        } else if let Some(note) = body.strip_prefix("Note: ") {
            example.description = Some(note.to_string());
        }
    }
}
