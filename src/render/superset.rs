use super::{Artifact, Renderer, TargetParams, single_line};
use crate::error::RenderError;
use crate::schema::Record;
use serde_json::{Value, json};

pub const TARGET: &str = "superset";

/// Superset dataset export carrying one record as a metric or a column.
///
/// A filtered metric becomes a virtual dataset whose SQL carries the WHERE
/// clause; otherwise the dataset points straight at the physical table.
/// Dimension hierarchies are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupersetRenderer;

impl Renderer for SupersetRenderer {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn render(&self, record: &Record, params: &TargetParams) -> Result<Artifact, RenderError> {
        let table = params.require(TARGET, "table")?;
        let schema = params.require(TARGET, "schema")?;
        let database = params.require(TARGET, "database")?;
        let default_label = title_case(record.name());
        let verbose_name = params.get_or("verbose_name", &default_label);

        let description = record.description().map(single_line);
        let extra = json!({
            "owner": record.owner(),
            "tags": record.tags(),
        });

        let (metrics, columns) = match record {
            Record::Metric(_) => (
                vec![json!({
                    "metric_name": record.name(),
                    "verbose_name": verbose_name,
                    "expression": record.expression(),
                    "description": description,
                    "extra": extra,
                })],
                Vec::new(),
            ),
            Record::Dimension(_) => (
                Vec::new(),
                vec![json!({
                    "column_name": record.name(),
                    "verbose_name": verbose_name,
                    "expression": record.expression(),
                    "description": description,
                    "groupby": true,
                    "filterable": true,
                    "extra": extra,
                })],
            ),
        };

        let mut dataset = json!({
            "table_name": table,
            "schema": schema,
            "database": { "database_name": database },
            "metrics": metrics,
            "columns": columns,
        });

        let filters = record.filters();
        if !filters.is_empty() {
            dataset["table_name"] = Value::String(format!("{table}_{}", record.name()));
            dataset["sql"] = Value::String(format!("SELECT * FROM {table} WHERE {}", filters.join(" AND ")));
        }

        Ok(Artifact {
            target: TARGET,
            file_name: format!("{}_dataset.json", record.name()),
            media_type: "application/json",
            body: format!("{dataset:#}\n"),
        })
    }
}

/// `active_users` -> `Active Users`
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::{active_users, customer_region};

    fn params() -> TargetParams {
        TargetParams::new()
            .with("table", "users")
            .with("schema", "public")
            .with("database", "analytics")
    }

    fn dataset(record: &Record, params: &TargetParams) -> Value {
        let artifact = SupersetRenderer.render(record, params).unwrap();
        assert_eq!(artifact.media_type, "application/json");
        serde_json::from_str(&artifact.body).unwrap()
    }

    #[test]
    fn metric_without_filters_is_a_physical_dataset() {
        let dataset = dataset(&active_users(&[]), &params());

        assert_eq!(dataset["table_name"], "users");
        assert_eq!(dataset["schema"], "public");
        assert_eq!(dataset["database"]["database_name"], "analytics");
        assert!(dataset.get("sql").is_none());
        assert_eq!(
            dataset["metrics"],
            json!([{
                "metric_name": "active_users",
                "verbose_name": "Active Users",
                "expression": "COUNT(DISTINCT user_id)",
                "description": null,
                "extra": { "owner": "growth-team", "tags": ["engagement", "kpi"] },
            }])
        );
        assert_eq!(dataset["columns"], json!([]));
    }

    #[test]
    fn filters_go_into_the_dataset_sql() {
        let dataset = dataset(&active_users(&["status = 'active'", "age > 18"]), &params());

        assert_eq!(dataset["table_name"], "users_active_users");
        assert_eq!(dataset["sql"], "SELECT * FROM users WHERE status = 'active' AND age > 18");
    }

    #[test]
    fn dimension_becomes_a_groupable_column() {
        let params = params().with("verbose_name", "Region");
        let dataset = dataset(&customer_region(), &params);

        assert_eq!(dataset["metrics"], json!([]));
        assert_eq!(dataset["columns"][0]["column_name"], "customer_region");
        assert_eq!(dataset["columns"][0]["verbose_name"], "Region");
        assert_eq!(dataset["columns"][0]["groupby"], true);
        assert!(!dataset.to_string().contains("country"));
    }

    #[test]
    fn connection_parameters_are_required() {
        for missing in ["table", "schema", "database"] {
            let mut params = TargetParams::new();
            for key in ["table", "schema", "database"] {
                if key != missing {
                    params.insert(key, "x");
                }
            }
            assert_eq!(
                SupersetRenderer.render(&active_users(&[]), &params),
                Err(RenderError::MissingParameter {
                    target: "superset",
                    parameter: missing
                })
            );
        }
    }

    #[test]
    fn labels_from_names() {
        assert_eq!(title_case("gross_margin"), "Gross Margin");
        assert_eq!(title_case("arr"), "Arr");
    }
}
