//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of a fixture tree under tests/test_data
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_data").join(name)
}

/// A throw-away definition root
pub struct DefinitionTree {
    dir: TempDir,
}

impl DefinitionTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Write `content` to `rel` below the root, creating directories
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.dir.path().join(rel)).unwrap();
    }

    pub fn metric(&self, file: &str, name: &str, expression: &str, filters: &[&str]) -> PathBuf {
        let filters: Vec<String> = filters.iter().map(|f| format!("{f:?}")).collect();
        self.write(
            &format!("metrics/{file}"),
            &format!(
                "name = {name:?}\nexpression = {expression:?}\nfilters = [{}]\n",
                filters.join(", ")
            ),
        )
    }
}
