//! Renderers turning a single record into a target-specific artifact.
//!
//! Every renderer is a stateless unit struct registered in [`RENDERERS`].
//! Rendering never touches a snapshot and never does I/O; for a fixed record
//! and parameter set the output is byte-identical across calls.

mod dbt;
mod lookml;
mod sql;
mod superset;
mod tableau;

pub use dbt::DbtRenderer;
pub use lookml::LookmlRenderer;
pub use sql::{SqlRenderer, select_statement};
pub use superset::SupersetRenderer;
pub use tableau::TableauRenderer;

use crate::error::{RenderError, Result};
use crate::registry::Snapshot;
use crate::schema::{Kind, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A rendered output, ready for the caller to store or serve.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub target: &'static str,
    pub file_name: String,
    pub media_type: &'static str,
    pub body: String,
}

/// Free-form `key = value` parameters for one render call.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TargetParams(BTreeMap<String, String>);

impl TargetParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.0.insert(key.into(), value.into());
    }

    /// A parameter the output cannot be correct without. Blank counts as missing.
    pub fn require(&self, target: &'static str, parameter: &'static str) -> std::result::Result<&str, RenderError> {
        self.0
            .get(parameter)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(RenderError::MissingParameter { target, parameter })
    }

    /// A cosmetic parameter with a fallback.
    pub fn get_or<'a>(&'a self, parameter: &str, default: &'a str) -> &'a str {
        self.0
            .get(parameter)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }
}

impl FromIterator<(String, String)> for TargetParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub trait Renderer: Send + Sync {
    /// Identifier used to select this renderer.
    fn target(&self) -> &'static str;

    fn render(&self, record: &Record, params: &TargetParams) -> std::result::Result<Artifact, RenderError>;
}

/// Static mapping from target identifier to renderer.
pub static RENDERERS: &[&dyn Renderer] = &[
    &SqlRenderer,
    &TableauRenderer,
    &DbtRenderer,
    &LookmlRenderer,
    &SupersetRenderer,
];

pub fn renderer(target: &str) -> Option<&'static dyn Renderer> {
    RENDERERS.iter().copied().find(|r| r.target() == target)
}

pub fn targets() -> Vec<&'static str> {
    RENDERERS.iter().map(|r| r.target()).collect()
}

/// Resolves a record in `snapshot` and renders it for `target`.
pub fn render(
    snapshot: &Snapshot,
    target: &str,
    kind: Kind,
    name: &str,
    params: &TargetParams,
) -> Result<Artifact> {
    let renderer = renderer(target).ok_or_else(|| RenderError::UnknownTarget(target.to_string()))?;
    let record = snapshot.get(kind, name)?;
    Ok(renderer.render(record, params)?)
}

/// Collapses free text onto one line so it cannot escape a line comment or a quoted value.
pub(crate) fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes text for use in XML attribute values and element content.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
