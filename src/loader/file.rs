//! File-backed units: one file per unit under a root directory.

use super::UnitLoader;
use crate::error::ApiError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Loaded contents of a file unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUnit {
    pub name: String,
    pub path: PathBuf,
    pub contents: String,
    /// blake3 digest of `contents`, hex encoded
    pub digest: String,
}

/// Loads units from `<root>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct FileUnitLoader {
    root: PathBuf,
    extension: String,
}

impl FileUnitLoader {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path a unit with the given name lives at.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, self.extension))
    }

    /// Unit name for a path, if the path has this loader's extension.
    pub fn name_for(&self, path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }

    /// List unit names found directly under the root, sorted.
    pub fn discover(&self) -> Result<Vec<String>, ApiError> {
        if !self.root.is_dir() {
            return Err(ApiError::ConfigError(format!(
                "Unit root is not a directory: {}",
                self.root.display()
            )));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ApiError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = self.name_for(entry.path()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

impl UnitLoader<FileUnit> for FileUnitLoader {
    fn load(&self, name: &str) -> Result<Arc<FileUnit>, String> {
        let path = self.path_for(name);
        let bytes = std::fs::read(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        if bytes.is_empty() {
            return Err(format!("Unit source is empty: {}", path.display()));
        }
        let contents = String::from_utf8(bytes)
            .map_err(|e| format!("Unit source is not valid UTF-8 ({}): {}", path.display(), e))?;
        let digest = blake3::hash(contents.as_bytes()).to_hex().to_string();

        Ok(Arc::new(FileUnit {
            name: name.to_string(),
            path,
            contents,
            digest,
        }))
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = self.path_for(name);
        Some(dunce::canonicalize(&path).unwrap_or(path))
    }
}
