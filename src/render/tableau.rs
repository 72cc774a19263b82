use super::{Artifact, Renderer, TargetParams, escape_xml, select_statement};
use crate::error::RenderError;
use crate::schema::Record;
use std::fmt::Write;

pub const TARGET: &str = "tableau";

const TDS_VERSION: &str = "18.1";

/// Custom SQL relation over a Snowflake connection. A dimension hierarchy becomes a drill path.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableauRenderer;

impl Renderer for TableauRenderer {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn render(&self, record: &Record, params: &TargetParams) -> Result<Artifact, RenderError> {
        let table = params.require(TARGET, "table")?;
        let server = params.require(TARGET, "server")?;
        let database = params.require(TARGET, "database")?;
        let schema = params.require(TARGET, "schema")?;
        let warehouse = params.require(TARGET, "warehouse")?;
        let default_caption = format!("{}_datasource", record.name());
        let caption = params.get_or("caption", &default_caption);

        let sql = select_statement(record, table);

        let mut body = String::new();
        body.push_str("<?xml version='1.0' encoding='utf-8' ?>\n");
        let _ = writeln!(
            body,
            "<datasource caption='{}' inline='true' version='{TDS_VERSION}'>",
            escape_xml(caption)
        );
        let _ = writeln!(
            body,
            "  <connection class='snowflake' server='{}' dbname='{}' schema='{}' warehouse='{}' authentication='username-password'>",
            escape_xml(server),
            escape_xml(database),
            escape_xml(schema),
            escape_xml(warehouse)
        );
        let _ = writeln!(
            body,
            "    <relation name='Custom SQL Query' type='text'>{}</relation>",
            escape_xml(&sql)
        );
        body.push_str("  </connection>\n");

        let column_name = escape_xml(&format!("[{}]", record.name()));
        match record {
            Record::Metric(_) => {
                let _ = writeln!(
                    body,
                    "  <column name='{column_name}' datatype='real' role='measure' type='quantitative' />"
                );
            }
            Record::Dimension(dimension) => {
                let _ = writeln!(
                    body,
                    "  <column name='{column_name}' datatype='string' role='dimension' type='nominal' />"
                );
                if !dimension.hierarchy.is_empty() {
                    body.push_str("  <drill-paths>\n");
                    let _ = writeln!(body, "    <drill-path name='{}'>", escape_xml(&dimension.name));
                    for level in &dimension.hierarchy {
                        let _ = writeln!(body, "      <field>{}</field>", escape_xml(&format!("[{level}]")));
                    }
                    body.push_str("    </drill-path>\n");
                    body.push_str("  </drill-paths>\n");
                }
            }
        }

        body.push_str("</datasource>\n");

        Ok(Artifact {
            target: TARGET,
            file_name: format!("{}.tds", record.name()),
            media_type: "application/xml",
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::{active_users, customer_region};

    fn connection() -> TargetParams {
        TargetParams::new()
            .with("table", "users")
            .with("server", "acme.snowflakecomputing.com")
            .with("database", "ANALYTICS")
            .with("schema", "PUBLIC")
            .with("warehouse", "COMPUTE_WH")
    }

    #[test]
    fn embeds_escaped_sql_and_connection() {
        let artifact = TableauRenderer
            .render(&active_users(&["status = 'active'"]), &connection())
            .unwrap();

        assert_eq!(artifact.file_name, "active_users.tds");
        assert!(artifact.body.contains("caption='active_users_datasource'"));
        assert!(artifact.body.contains("server='acme.snowflakecomputing.com'"));
        assert!(artifact.body.contains("warehouse='COMPUTE_WH'"));
        assert!(artifact.body.contains(
            "SELECT COUNT(DISTINCT user_id) AS active_users FROM users WHERE status = &apos;active&apos;;</relation>"
        ));
        assert_eq!(artifact.body.matches("<column ").count(), 1);
        assert!(artifact.body.contains("role='measure'"));
    }

    #[test]
    fn caption_override() {
        let params = connection().with("caption", "Active Users");
        let body = TableauRenderer.render(&active_users(&[]), &params).unwrap().body;
        assert!(body.contains("caption='Active Users'"));
    }

    #[test]
    fn dimension_hierarchy_becomes_drill_path() {
        let body = TableauRenderer.render(&customer_region(), &connection()).unwrap().body;
        let country = body.find("[country]").unwrap();
        let state = body.find("[state]").unwrap();
        let city = body.find("[city]").unwrap();
        assert!(country < state && state < city);
        assert!(body.contains("role='dimension'"));
    }

    #[test]
    fn every_connection_coordinate_is_required() {
        for missing in ["table", "server", "database", "schema", "warehouse"] {
            let params: TargetParams = [("table", "users"), ("server", "s"), ("database", "d"), ("schema", "p"), ("warehouse", "w")]
                .into_iter()
                .filter(|(k, _)| *k != missing)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            let err = TableauRenderer.render(&active_users(&[]), &params).unwrap_err();
            assert_eq!(
                err,
                RenderError::MissingParameter {
                    target: "tableau",
                    parameter: missing
                }
            );
        }
    }
}
