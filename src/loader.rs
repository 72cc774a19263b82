//! Reads definition documents from disk and validates them into a [`Snapshot`].
//!
//! Each source location is a root directory. Documents under `<root>/metrics/`
//! are metrics and documents under `<root>/dimensions/` are dimensions, at any
//! depth. TOML (`.toml`) and YAML (`.yaml`, `.yml`) are accepted; any other
//! file is skipped. A load either admits every document or fails as a whole.

use crate::error::ValidationError;
use crate::registry::{Snapshot, SnapshotBuilder};
use crate::schema::{Dimension, Document, Kind, Metric, Record};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Some(Format::Toml),
            Some("yaml" | "yml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Loads every document below `sources` into a new snapshot.
pub fn load<P: AsRef<Path>>(sources: &[P]) -> Result<Snapshot, ValidationError> {
    let mut builder = SnapshotBuilder::default();

    for root in sources {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ValidationError::MissingSource {
                path: root.to_path_buf(),
            });
        }

        for kind in Kind::ALL {
            for path in document_paths(&root.join(kind.directory()))? {
                let record = load_document(&path, kind)?;
                debug!(kind = %kind, name = record.name(), path = %path.display(), "admitted definition");
                builder.insert(record, path)?;
            }
        }
    }

    Ok(builder.finish())
}

/// Definition files below `dir` in lexicographic order. A missing directory yields none.
fn document_paths(dir: &Path) -> Result<Vec<PathBuf>, ValidationError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| ValidationError::Io {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: e.into(),
        })?;

        if entry.file_type().is_file() && Format::of(entry.path()).is_some() {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

/// Reads, parses and validates one document of a known kind.
pub fn load_document(path: &Path, kind: Kind) -> Result<Record, ValidationError> {
    let content = fs::read_to_string(path).map_err(|e| ValidationError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let format = Format::of(path).unwrap_or(Format::Toml);
    let document = parse_document(&content, format).map_err(|message| ValidationError::Malformed {
        path: path.to_path_buf(),
        message,
    })?;

    validate(document, kind, path)
}

fn parse_document(content: &str, format: Format) -> Result<Document, String> {
    match format {
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Turns a parsed document into a record, enforcing the per-field rules.
pub fn validate(document: Document, kind: Kind, path: &Path) -> Result<Record, ValidationError> {
    if let Some(declared) = document.kind {
        if declared != kind {
            return Err(ValidationError::KindMismatch {
                path: path.to_path_buf(),
                declared,
                expected: kind,
            });
        }
    }

    let name = required(document.name, "name", path)?;
    if name.chars().any(char::is_whitespace) {
        return Err(ValidationError::Malformed {
            path: path.to_path_buf(),
            message: format!("name '{name}' must not contain whitespace"),
        });
    }
    let expression = required(document.expression, "expression", path)?;
    let tags = document.tags.unwrap_or_default().into_iter().collect();

    match kind {
        Kind::Metric => {
            if document.hierarchy.is_some() {
                return Err(unexpected("hierarchy", kind, path));
            }
            let filters = document.filters.unwrap_or_default();
            if filters.iter().any(|f| f.trim().is_empty()) {
                return Err(ValidationError::EmptyField {
                    path: path.to_path_buf(),
                    field: "filters",
                });
            }
            Ok(Record::Metric(Metric {
                name,
                expression,
                filters,
                owner: document.owner,
                description: document.description,
                tags,
            }))
        }
        Kind::Dimension => {
            if document.filters.is_some() {
                return Err(unexpected("filters", kind, path));
            }
            let hierarchy = document.hierarchy.unwrap_or_default();
            if hierarchy.iter().any(|level| level.trim().is_empty()) {
                return Err(ValidationError::EmptyField {
                    path: path.to_path_buf(),
                    field: "hierarchy",
                });
            }
            Ok(Record::Dimension(Dimension {
                name,
                expression,
                hierarchy,
                owner: document.owner,
                description: document.description,
                tags,
            }))
        }
    }
}

fn required(value: Option<String>, field: &'static str, path: &Path) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::MissingField {
        path: path.to_path_buf(),
        field,
    })?;

    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            path: path.to_path_buf(),
            field,
        });
    }

    Ok(value.trim().to_string())
}

fn unexpected(field: &'static str, kind: Kind, path: &Path) -> ValidationError {
    ValidationError::UnexpectedField {
        path: path.to_path_buf(),
        field,
        kind,
    }
}
