use super::{Artifact, Renderer, TargetParams, single_line};
use crate::error::RenderError;
use crate::schema::Record;
use std::fmt::Write;

pub const TARGET: &str = "lookml";

/// LookML view exposing one record as a measure or dimension.
///
/// A filtered metric reads from a derived table carrying the WHERE clause,
/// so the measure keeps the same semantics as the plain SQL projection.
/// Dimension hierarchies are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookmlRenderer;

impl Renderer for LookmlRenderer {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn render(&self, record: &Record, params: &TargetParams) -> Result<Artifact, RenderError> {
        let table = params.require(TARGET, "table")?;
        let view = params.get_or("view", table);

        let mut body = String::new();
        let _ = writeln!(body, "view: {view} {{");

        let filters = record.filters();
        if filters.is_empty() {
            let _ = writeln!(body, "  sql_table_name: {table} ;;");
        } else {
            body.push_str("  derived_table: {\n");
            let _ = writeln!(
                body,
                "    sql: SELECT * FROM {table} WHERE {} ;;",
                filters.join(" AND ")
            );
            body.push_str("  }\n");
        }
        body.push('\n');

        let field = match record {
            Record::Metric(_) => "measure",
            Record::Dimension(_) => "dimension",
        };
        let _ = writeln!(body, "  {field}: {} {{", record.name());
        match record {
            Record::Metric(_) => body.push_str("    type: number\n"),
            Record::Dimension(_) => body.push_str("    type: string\n"),
        }
        let _ = writeln!(body, "    sql: {} ;;", record.expression());
        if let Some(description) = record.description() {
            let _ = writeln!(body, "    description: {}", quoted(description));
        }
        if !record.tags().is_empty() {
            let tags: Vec<String> = record.tags().iter().map(|t| quoted(t)).collect();
            let _ = writeln!(body, "    tags: [{}]", tags.join(", "));
        }
        body.push_str("  }\n");
        body.push_str("}\n");

        Ok(Artifact {
            target: TARGET,
            file_name: format!("{view}.view.lkml"),
            media_type: "text/plain",
            body,
        })
    }
}

/// A LookML string literal holding `s` on one line.
fn quoted(s: &str) -> String {
    format!("\"{}\"", single_line(s).replace('\\', "\\\\").replace('"', "\\\""))
}
