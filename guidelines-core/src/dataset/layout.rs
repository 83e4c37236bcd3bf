//! Filesystem BIDS indexer
//!
//! Walks a dataset once, parses every BIDS-conformant filename and keeps the
//! result as an immutable snapshot. Sidecar metadata is resolved on demand
//! following the BIDS inheritance principle.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};
use walkdir::{DirEntry, WalkDir};

use super::{BidsFile, DatasetIndex, Entities, FileFilter, Metadata, DATATYPES};
use crate::error::{GuidelineError, Result};

/// Indexed snapshot of a BIDS directory
#[derive(Debug, Clone)]
pub struct BidsLayout {
    root: PathBuf,
    files: Vec<BidsFile>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| exclude.iter().any(|e| e == name))
            .unwrap_or(false)
}

impl BidsLayout {
    /// Index the dataset at `root`, skipping the top-level directories in `exclude`
    pub fn open(root: impl AsRef<Path>, exclude: &[String]) -> Result<Self> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(GuidelineError::DatasetMissing {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(GuidelineError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        info!("Indexing BIDS dataset: {:?}", root);

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e) && !is_excluded(e, exclude));

        for entry in walker {
            let entry = entry.map_err(|e| GuidelineError::Index {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                trace!("Skipping non UTF-8 filename: {:?}", entry.path());
                continue;
            };

            let datatype = entry
                .path()
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .filter(|n| DATATYPES.contains(n));

            match Entities::parse(name, datatype) {
                Some(entities) => files.push(BidsFile::new(entry.path(), entities)),
                None => trace!("Ignoring non-BIDS file: {:?}", entry.path()),
            }
        }

        debug!("Indexed {} BIDS files under {:?}", files.len(), root);

        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Files that apply to `target` under the inheritance principle
    ///
    /// A candidate has the target's suffix and extension, no conflicting
    /// datatype, a subset of its entities, and lives in `directory` or one of
    /// its ancestors. Ordered least specific first.
    fn inherited<'a>(&'a self, target: &Entities, directory: &Path) -> Vec<&'a BidsFile> {
        let mut candidates: Vec<&BidsFile> = self
            .files
            .iter()
            .filter(|c| {
                let e = c.entities();
                e.extension() == target.extension()
                    && e.suffix() == target.suffix()
                    && e.datatype().map_or(true, |d| Some(d) == target.datatype())
                    && e.is_subset_of(target)
                    && c.path()
                        .parent()
                        .map_or(false, |dir| directory.starts_with(dir))
            })
            .collect();

        candidates.sort_by_key(|c| {
            let depth = c.path().components().count();
            (depth, c.entities().pairs().len())
        });

        candidates
    }

    /// Directory a file with these entities would live in
    fn directory_for(&self, entities: &Entities) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(subject) = entities.subject() {
            path.push(format!("sub-{subject}"));
        }
        if let Some(session) = entities.session() {
            path.push(format!("ses-{session}"));
        }
        if let Some(datatype) = entities.datatype() {
            path.push(datatype);
        }
        path
    }

    fn read_sidecar(path: &Path) -> Result<Metadata> {
        let content = std::fs::read_to_string(path)?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| GuidelineError::Sidecar {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(GuidelineError::Sidecar {
                path: path.to_path_buf(),
                message: "sidecar is not a JSON object".to_string(),
            }),
        }
    }
}

impl DatasetIndex for BidsLayout {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tasks(&self) -> Result<Vec<String>> {
        let tasks: BTreeSet<&str> = self
            .files
            .iter()
            .filter_map(|f| f.entities().task())
            .collect();

        Ok(tasks.into_iter().map(str::to_string).collect())
    }

    fn find_files(&self, filter: &FileFilter) -> Result<Vec<BidsFile>> {
        Ok(self
            .files
            .iter()
            .filter(|f| filter.matches(f.entities()))
            .cloned()
            .collect())
    }

    fn metadata(&self, file: &BidsFile) -> Result<Metadata> {
        let mut merged = Metadata::new();

        let target = file.entities().clone().with_extension("json");
        let directory = file.path().parent().unwrap_or(self.root.as_path());

        for sidecar in self.inherited(&target, directory) {
            trace!("Applying sidecar {:?} to {:?}", sidecar.path(), file.path());
            merged.extend(Self::read_sidecar(sidecar.path())?);
        }

        Ok(merged)
    }

    fn resolve_sibling(&self, entities: &Entities) -> Result<Option<PathBuf>> {
        let directory = self.directory_for(entities);
        let sibling = self
            .inherited(entities, &directory)
            .last()
            .map(|f| f.path().to_path_buf());

        trace!("Sibling {} resolved to {:?}", entities.filename(), sibling);
        Ok(sibling)
    }
}
