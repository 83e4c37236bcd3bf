//! Guideline catalog - identifier to descriptive text lookup
//!
//! The catalog is a phonebook: it maps a hierarchical guideline identifier
//! (`D02.02.01.00.00.01`) to the label and detail text of that checklist item.
//! It holds no logic. Rules reference it by identifier and the report uses it
//! to print human-readable labels.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::engine::Standard;
use crate::error::{GuidelineError, Result};

pub mod convert;


const COBIDAS_CATALOG: &str = include_str!("../../data/cobidas.yaml");

pub(crate) static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]?[0-9]+(\.[0-9]+)*$").expect("identifier pattern is valid"));

/// One checklist item of a guideline standard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidelineEntry {
    /// Dot-separated hierarchical identifier
    pub id: String,
    /// Table and aspect labels joined with `" | "`
    pub info: String,
    /// What the guideline asks authors to report
    pub text: String,
}

/// On-disk shape of a single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub info: String,
    #[serde(default)]
    pub text: String,
}

/// On-disk shape of a catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, deserialize_with = "unique_entries")]
    pub guidelines: BTreeMap<String, EntryRecord>,
}

/// Deserialize the `guidelines` mapping, rejecting repeated identifiers
fn unique_entries<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, EntryRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueEntries;

    impl<'de> Visitor<'de> for UniqueEntries {
        type Value = BTreeMap<String, EntryRecord>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of guideline identifiers to entries")
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = BTreeMap::new();
            while let Some(id) = map.next_key::<String>()? {
                if entries.contains_key(&id) {
                    return Err(de::Error::custom(format!(
                        "duplicate guideline identifier '{id}'"
                    )));
                }
                let record = map.next_value::<EntryRecord>()?;
                entries.insert(id, record);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(UniqueEntries)
}

/// Read-only guideline catalog keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct GuidelineCatalog {
    entries: BTreeMap<String, GuidelineEntry>,
}

impl GuidelineCatalog {
    /// Load a catalog from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading guideline catalog from: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|source| GuidelineError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&path.display().to_string(), &content)
    }

    /// The catalog shipped with the binary for a standard
    pub fn builtin(standard: Standard) -> Result<Self> {
        match standard {
            Standard::Cobidas => Self::from_yaml_str("builtin:cobidas.yaml", COBIDAS_CATALOG),
            other => Err(GuidelineError::NotImplemented {
                standard: other.to_string(),
            }),
        }
    }

    /// Parse a catalog; `source` names the input in error messages
    pub fn from_yaml_str(source: &str, content: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_yaml_ng::from_str(content).map_err(|e| GuidelineError::CatalogParse {
                path: source.to_string(),
                message: e.to_string(),
            })?;

        Self::from_document(source, document)
    }

    /// Build a catalog from an already-deserialized document
    pub fn from_document(source: &str, document: CatalogDocument) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for (id, record) in document.guidelines {
            if !IDENTIFIER.is_match(&id) {
                return Err(GuidelineError::CatalogParse {
                    path: source.to_string(),
                    message: format!("invalid guideline identifier '{id}'"),
                });
            }

            entries.insert(
                id.clone(),
                GuidelineEntry {
                    id,
                    info: record.info,
                    text: record.text,
                },
            );
        }

        debug!("Loaded {} guideline entries from {}", entries.len(), source);

        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&GuidelineEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Descriptive label for an identifier, empty when unknown
    pub fn label(&self, id: &str) -> &str {
        self.entries.get(id).map(|e| e.info.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &GuidelineEntry> {
        self.entries.values()
    }
}
