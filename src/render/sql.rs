use super::{Artifact, Renderer, TargetParams};
use crate::error::RenderError;
use crate::schema::Record;

pub const TARGET: &str = "sql";

/// Plain SQL projection of one record over a base table.
///
/// Dimension hierarchies have no place in a flat projection and are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer;

impl Renderer for SqlRenderer {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn render(&self, record: &Record, params: &TargetParams) -> Result<Artifact, RenderError> {
        let table = params.require(TARGET, "table")?;
        Ok(Artifact {
            target: TARGET,
            file_name: format!("{}.sql", record.name()),
            media_type: "application/sql",
            body: select_statement(record, table),
        })
    }
}

/// `SELECT <expression> AS <name> FROM <table> [WHERE f1 AND f2 ...];`
pub fn select_statement(record: &Record, table: &str) -> String {
    let mut sql = format!("SELECT {} AS {} FROM {}", record.expression(), record.name(), table);

    let filters = record.filters();
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }

    sql.push(';');
    sql
}
