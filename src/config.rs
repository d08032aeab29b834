use crate::error::{Result, TilingError};
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Registry of logical dataset names and the files they resolve to.
///
/// Built once at start-up (from `--dataset NAME=PATH` options) and passed to
/// whatever needs to look datasets up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetPaths {
    entries: BTreeMap<String, PathBuf>,
}

impl DatasetPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `NAME=PATH` entries. Later entries replace earlier ones.
    pub fn from_entries<S: AsRef<str>>(entries: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut paths = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            let (name, path) = entry
                .split_once('=')
                .map(|(n, p)| (n.trim(), p.trim()))
                .filter(|(n, p)| !n.is_empty() && !p.is_empty())
                .ok_or_else(|| TilingError::InvalidDatasetEntry(entry.to_string()))?;
            paths.insert(name, path);
        }
        Ok(paths)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        let path = path.into();
        debug!("Dataset '{}' → {}", name, path.display());
        self.entries.insert(name, path);
    }

    pub fn get(&self, name: &str) -> Result<&Path> {
        self.entries
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| TilingError::UnknownDataset(name.to_string()))
    }

    /// Registered path for `name`, or `name` itself taken as a path.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.entries
            .get(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
