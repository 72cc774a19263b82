use super::{Artifact, Renderer, TargetParams, single_line};
use crate::error::RenderError;
use crate::schema::Record;
use std::fmt::Write;

pub const TARGET: &str = "dbt";

/// dbt model (`models/marts/mart_<name>.sql`) materialising one metric.
///
/// dbt models have no notion of a standalone dimension, so dimensions are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbtRenderer;

impl Renderer for DbtRenderer {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn render(&self, record: &Record, params: &TargetParams) -> Result<Artifact, RenderError> {
        let Record::Metric(metric) = record else {
            return Err(RenderError::UnsupportedFeature {
                target: TARGET,
                feature: "dimension".to_string(),
            });
        };
        let table = params.require(TARGET, "table")?;

        let mut body = String::new();
        body.push_str("{{ config(materialized='table') }}\n\n");

        let _ = writeln!(body, "-- Metric: {}", metric.name);
        if let Some(description) = record.description() {
            let _ = writeln!(body, "-- {}", single_line(description));
        }
        if let Some(owner) = record.owner() {
            let _ = writeln!(body, "-- Owner: {}", single_line(owner));
        }
        if !metric.tags.is_empty() {
            let tags: Vec<String> = metric.tags.iter().map(|t| single_line(t)).collect();
            let _ = writeln!(body, "-- Tags: {}", tags.join(", "));
        }

        let _ = writeln!(body, "SELECT {} AS {}", metric.expression, metric.name);
        let _ = writeln!(body, "FROM {{{{ ref('{table}') }}}}");

        for (i, filter) in metric.filters.iter().enumerate() {
            if i == 0 {
                let _ = writeln!(body, "WHERE {filter}");
            } else {
                let _ = writeln!(body, "  AND {filter}");
            }
        }

        Ok(Artifact {
            target: TARGET,
            file_name: format!("mart_{}.sql", metric.name),
            media_type: "application/sql",
            body,
        })
    }
}
