use crate::schema::Kind;
use std::path::PathBuf;
use thiserror::Error;

/// Why a load attempt was rejected. Always fatal to the whole load.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("source location '{path}' is not a readable directory")]
    MissingSource { path: PathBuf },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("'{path}': missing required field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("'{path}': field `{field}` must not be empty")]
    EmptyField { path: PathBuf, field: &'static str },

    #[error("'{path}': field `{field}` is not allowed on a {kind}")]
    UnexpectedField {
        path: PathBuf,
        field: &'static str,
        kind: Kind,
    },

    #[error("'{path}': declares kind `{declared}` but lives in the {expected} directory")]
    KindMismatch {
        path: PathBuf,
        declared: Kind,
        expected: Kind,
    },

    #[error("duplicate {kind} '{name}' defined in '{first}' and '{second}'")]
    Duplicate {
        kind: Kind,
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} '{name}' not found")]
pub struct NotFoundError {
    pub kind: Kind,
    pub name: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown render target '{0}'")]
    UnknownTarget(String),

    #[error("target '{target}' does not support {feature}")]
    UnsupportedFeature {
        target: &'static str,
        feature: String,
    },

    #[error("target '{target}' requires parameter '{parameter}'")]
    MissingParameter {
        target: &'static str,
        parameter: &'static str,
    },
}

/// Any error the registry core can hand back to a caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, Error>;
