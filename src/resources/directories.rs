//! Logical resource directories

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("No resource directory registered for '{0}'")]
    Unregistered(String),
    #[error("Empty file name for resource directory '{0}'")]
    EmptyFilename(String),
}

/// Table mapping a logical directory id such as `"textures"` to a path.
///
/// Every file-backed resource resolves its `(folder_id, filename)` pair here
/// before touching the filesystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDirectories {
    entries: BTreeMap<String, PathBuf>,
}

impl ResourceDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a directory, returning the previous path
    pub fn register(&mut self, id: &str, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.entries.insert(id.to_string(), path.into())
    }

    pub fn with(mut self, id: &str, path: impl Into<PathBuf>) -> Self {
        self.register(id, path);
        self
    }

    pub fn remove(&mut self, id: &str) -> Option<PathBuf> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolve `filename` inside the directory registered as `folder_id`
    pub fn resolve(&self, folder_id: &str, filename: &str) -> Result<PathBuf, DirectoryError> {
        let directory = self
            .entries
            .get(folder_id)
            .ok_or_else(|| DirectoryError::Unregistered(folder_id.to_string()))?;
        if filename.is_empty() {
            return Err(DirectoryError::EmptyFilename(folder_id.to_string()));
        }
        Ok(directory.join(filename))
    }
}
