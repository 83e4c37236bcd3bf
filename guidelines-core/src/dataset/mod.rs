//! Dataset index - structured access to a BIDS dataset's files and metadata
//!
//! Rules never touch the filesystem directly. They query a [`DatasetIndex`],
//! which makes them pure functions of an indexed snapshot and lets tests
//! substitute an in-memory dataset.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub mod entities;
pub mod layout;

pub use entities::{normalize_extension, Entities, DATATYPES};
pub use layout::BidsLayout;

/// Sidecar metadata for one file
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single indexed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidsFile {
    path: PathBuf,
    entities: Entities,
}

impl BidsFile {
    pub fn new(path: impl Into<PathBuf>, entities: Entities) -> Self {
        Self {
            path: path.into(),
            entities,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }
}

/// File query; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    pub task: Option<String>,
    pub datatype: Option<String>,
    pub suffix: Option<String>,
    pub extension: Option<String>,
}

impl FileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: &str) -> Self {
        self.task = Some(task.to_string());
        self
    }

    pub fn datatype(mut self, datatype: &str) -> Self {
        self.datatype = Some(datatype.to_string());
        self
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Accepts `nii.gz` or `.nii.gz`
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(normalize_extension(extension));
        self
    }

    pub fn matches(&self, entities: &Entities) -> bool {
        fn field(want: &Option<String>, have: Option<&str>) -> bool {
            want.as_deref().map_or(true, |w| have == Some(w))
        }

        field(&self.task, entities.task())
            && field(&self.datatype, entities.datatype())
            && field(&self.suffix, Some(entities.suffix()))
            && field(&self.extension, Some(entities.extension()))
    }

    /// Short human-readable form, e.g. `perf/asl .nii.gz`
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (&self.datatype, &self.suffix) {
            (Some(d), Some(s)) => parts.push(format!("{d}/{s}")),
            (Some(d), None) => parts.push(format!("{d}/*")),
            (None, Some(s)) => parts.push(format!("*/{s}")),
            (None, None) => {}
        }
        if let Some(task) = &self.task {
            parts.push(format!("task-{task}"));
        }
        if let Some(ext) = &self.extension {
            parts.push(ext.clone());
        }
        if parts.is_empty() {
            "all files".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Read access to an indexed dataset
pub trait DatasetIndex {
    /// Dataset root directory
    fn root(&self) -> &Path;

    /// Distinct task labels, sorted
    fn list_tasks(&self) -> Result<Vec<String>>;

    /// Files matching the filter, sorted by path
    fn find_files(&self, filter: &FileFilter) -> Result<Vec<BidsFile>>;

    /// Merged sidecar metadata for a file
    fn metadata(&self, file: &BidsFile) -> Result<Metadata>;

    /// Path of the file described by `entities`, if it exists
    fn resolve_sibling(&self, entities: &Entities) -> Result<Option<PathBuf>>;
}
