//! Offline parsing of snippets, one per line, from a file or stdin.
//!
//! Useful for checking the grammar against saved snippets and for trying out
//! custom schemas without touching Gmail.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use otbeat_config::Config;
use otbeat_core::{Extractor, MatchResult, Schema, SortOrder, WorkoutSchema};
use otbeat_report::{CsvWriter, WorkoutReport, process_snippets};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    /// One JSON object per matched line
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct ParseInput {
    /// Snippet file; stdin when absent
    pub input: Option<PathBuf>,
    /// JSON schema file; the workout grammar when absent
    pub schema: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub sort: Option<SortOrder>,
    pub output: Option<PathBuf>,
}

/// Strategy for the Parse command.
///
/// With the built-in workout grammar the default output is the same CSV
/// report `report` writes. With a custom schema the default is JSON lines.
#[derive(Debug, Clone, Copy)]
pub struct ParseStrategy;

impl super::CommandStrategy for ParseStrategy {
    type Input = ParseInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let text = match &input.input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("error reading snippets from {}", path.display()))?,
            None => io::read_to_string(io::stdin()).context("error reading snippets from stdin")?,
        };
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

        let Some(schema_path) = &input.schema else {
            let schema = WorkoutSchema::compile()?;
            return match input.format.unwrap_or(OutputFormat::Csv) {
                OutputFormat::Csv => {
                    let sort = match input.sort {
                        Some(sort) => sort,
                        None => Config::load()?.report.sort,
                    };
                    let outcome = process_snippets(&schema, &lines);
                    info!(
                        "Parsed {} of {} snippets",
                        outcome.summaries.len(),
                        outcome.total()
                    );
                    let output = super::open_output(input.output.as_deref())?;
                    WorkoutReport::new(outcome.summaries, sort).write_csv(output)?;
                    Ok(())
                }
                OutputFormat::Json => {
                    let output = super::open_output(input.output.as_deref())?;
                    write_json_lines(schema.extractor(), &lines, output)
                }
            };
        };

        let extractor = load_schema(schema_path)?;
        let output = super::open_output(input.output.as_deref())?;
        match input.format.unwrap_or(OutputFormat::Json) {
            OutputFormat::Json => write_json_lines(&extractor, &lines, output),
            OutputFormat::Csv => write_field_csv(&extractor, &lines, output),
        }
    }
}

fn load_schema(path: &Path) -> anyhow::Result<Extractor> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("error reading schema {}", path.display()))?;
    let extractor = Schema::from_json(&json)
        .with_context(|| format!("invalid schema file {}", path.display()))?
        .compile()
        .with_context(|| format!("schema {} does not compile", path.display()))?;
    Ok(extractor)
}

fn matched_records<'a>(
    extractor: &'a Extractor,
    lines: &'a [&str],
) -> impl Iterator<Item = otbeat_core::Record> + 'a {
    lines.iter().filter_map(|line| match extractor.extract(line) {
        MatchResult::Matched(record) => Some(record),
        MatchResult::NotMatched => {
            warn!("snippet did not match pattern, ignoring: {line}");
            None
        }
    })
}

fn write_json_lines(
    extractor: &Extractor,
    lines: &[&str],
    mut output: Box<dyn Write>,
) -> anyhow::Result<()> {
    for record in matched_records(extractor, lines) {
        serde_json::to_writer(&mut output, &record)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;
    Ok(())
}

/// CSV with one column per named field, in declaration order.
fn write_field_csv(
    extractor: &Extractor,
    lines: &[&str],
    output: Box<dyn Write>,
) -> anyhow::Result<()> {
    let mut csv = CsvWriter::new(output);
    csv.write_record(extractor.field_names())?;
    for record in matched_records(extractor, lines) {
        csv.write_record(record.iter().map(|(_, value)| value))?;
    }
    csv.finish()?.flush()?;
    Ok(())
}
