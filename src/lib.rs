//! Registry of business metric and dimension definitions.
//!
//! Definitions are loaded from TOML or YAML documents into an immutable
//! [`Snapshot`], queried by kind and name, and rendered into artifacts for
//! downstream tools (SQL, Tableau, dbt, LookML, Superset).
//!
//! ```ignore
//! use semantic_registry::{Kind, Registry, render};
//!
//! let registry = Registry::open(vec!["semantics".into()])?;
//! let snapshot = registry.snapshot();
//! let params = render::TargetParams::new().with("table", "users");
//! let sql = render::render(&snapshot, "sql", Kind::Metric, "active_users", &params)?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod loader;
pub mod registry;
pub mod render;
pub mod schema;
pub mod watch;

pub use error::{Error, NotFoundError, RenderError, Result, ValidationError};
pub use loader::load;
pub use registry::{Registry, Snapshot};
pub use render::{Artifact, Renderer, TargetParams};
pub use schema::{Dimension, Kind, Metric, Record};
