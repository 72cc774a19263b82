use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "registry.toml";

fn default_semantics() -> Vec<PathBuf> {
    vec![PathBuf::from("semantics")]
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root directories holding `metrics/` and `dimensions/`.
    #[serde(default = "default_semantics")]
    pub semantics: Vec<PathBuf>,

    #[serde(default = "default_bind")]
    pub bind: String,

    /// Reload automatically when source documents change.
    #[serde(default)]
    pub watch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            semantics: default_semantics(),
            bind: default_bind(),
            watch: false,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Reads `path` if given; otherwise `registry.toml` when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path).with_context(|| format!("could not read config file '{}'", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn overrides() {
        let config = Config::from_toml(
            r#"
            semantics = ["defs/core", "defs/finance"]
            bind = "127.0.0.1:8080"
            watch = true
            "#,
        )
        .unwrap();

        assert_eq!(config.semantics, vec![PathBuf::from("defs/core"), PathBuf::from("defs/finance")]);
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert!(config.watch);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("jwt_secret = \"x\"").is_err());
    }
}
