use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The two kinds of definition the registry knows about.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Metric,
    Dimension,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Metric, Kind::Dimension];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Metric => "metric",
            Kind::Dimension => "dimension",
        }
    }

    /// Name of the directory under a source root holding documents of this kind.
    pub fn directory(self) -> &'static str {
        match self {
            Kind::Metric => "metrics",
            Kind::Dimension => "dimensions",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown kind '{}' (expected 'metric' or 'dimension')", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for Kind {
    type Err = UnknownKind;

    /// Accepts the singular and the plural form, as used by the HTTP routes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" | "metrics" => Ok(Kind::Metric),
            "dimension" | "dimensions" => Ok(Kind::Dimension),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Metric {
    pub name: String,
    pub expression: String,
    /// Predicates combined with AND, in source order.
    pub filters: Vec<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub expression: String,
    /// Level names, coarsest first. Empty means no hierarchy.
    pub hierarchy: Vec<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
}

/// A validated definition admitted into a snapshot.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Metric(Metric),
    Dimension(Dimension),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::Metric(_) => Kind::Metric,
            Record::Dimension(_) => Kind::Dimension,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Record::Metric(m) => &m.name,
            Record::Dimension(d) => &d.name,
        }
    }

    pub fn expression(&self) -> &str {
        match self {
            Record::Metric(m) => &m.expression,
            Record::Dimension(d) => &d.expression,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Record::Metric(m) => m.owner.as_deref(),
            Record::Dimension(d) => d.owner.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Record::Metric(m) => m.description.as_deref(),
            Record::Dimension(d) => d.description.as_deref(),
        }
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        match self {
            Record::Metric(m) => &m.tags,
            Record::Dimension(d) => &d.tags,
        }
    }

    /// Filters of a metric; dimensions have none.
    pub fn filters(&self) -> &[String] {
        match self {
            Record::Metric(m) => &m.filters,
            Record::Dimension(_) => &[],
        }
    }
}

/// The loosely-checked shape of one source document, before validation.
///
/// Both TOML and YAML documents deserialize into this. Structural problems
/// (wrong types, unknown keys) surface as parser errors; semantic checks
/// (required fields, emptiness, fields foreign to a kind) are done by the loader.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub kind: Option<Kind>,
    pub name: Option<String>,
    #[serde(alias = "definition")]
    pub expression: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub filters: Option<Vec<String>>,
    pub hierarchy: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_singular_and_plural() {
        assert_eq!("metric".parse::<Kind>().unwrap(), Kind::Metric);
        assert_eq!("dimensions".parse::<Kind>().unwrap(), Kind::Dimension);
        assert!("Metric".parse::<Kind>().is_err());
    }

    #[test]
    fn document_accepts_definition_alias() {
        let doc: Document = toml::from_str(
            r#"
            name = "active_users"
            definition = "COUNT(DISTINCT user_id)"
            "#,
        )
        .unwrap();
        assert_eq!(doc.expression.as_deref(), Some("COUNT(DISTINCT user_id)"));
    }

    #[test]
    fn document_rejects_scalar_hierarchy() {
        let result: Result<Document, _> = toml::from_str(
            r#"
            name = "region"
            expression = "region"
            hierarchy = "country"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn record_serializes_with_kind_tag() {
        let record = Record::Dimension(Dimension {
            name: "customer_region".into(),
            expression: "region".into(),
            hierarchy: vec!["country".into(), "state".into()],
            owner: None,
            description: None,
            tags: BTreeSet::new(),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "dimension");
        assert_eq!(json["hierarchy"][1], "state");
    }
}
