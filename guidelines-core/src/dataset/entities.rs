//! BIDS filename entities
//!
//! `sub-01_ses-02_task-rest_run-1_bold.nii.gz` parses into the ordered
//! key/value pairs `sub/ses/task/run`, the suffix `bold` and the extension
//! `.nii.gz`. The datatype comes from the parent directory, not the name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<pairs>[a-zA-Z0-9]+-[a-zA-Z0-9]+(?:_[a-zA-Z0-9]+-[a-zA-Z0-9]+)*)_)?(?P<suffix>[a-zA-Z0-9]+)(?P<extension>\.[^/]+)?$")
        .expect("filename pattern is valid")
});

/// Dataset-level files whose names also fit the entity-less grammar
const DATASET_FILES: &[&str] = &[
    "participants",
    "samples",
    "README",
    "CHANGES",
    "LICENSE",
    "CITATION",
    "genetic_info",
];

/// Directory names that denote a BIDS datatype
pub const DATATYPES: &[&str] = &[
    "anat", "func", "dwi", "fmap", "perf", "beh", "eeg", "meg", "ieeg", "pet", "micr", "nirs",
    "motion",
];

/// Add the leading dot to an extension if it is missing
pub fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

/// Structured view of a BIDS filename
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Entities {
    pairs: Vec<(String, String)>,
    datatype: Option<String>,
    suffix: String,
    extension: String,
}

impl Entities {
    /// Parse a filename; `None` when it does not follow the BIDS grammar
    pub fn parse(filename: &str, datatype: Option<&str>) -> Option<Self> {
        let captures = FILENAME.captures(filename)?;

        let pairs: Vec<(String, String)> = match captures.name("pairs") {
            Some(pairs) => pairs
                .as_str()
                .split('_')
                .filter_map(|pair| pair.split_once('-'))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            None => Vec::new(),
        };

        // Without entities only inheritable files qualify (`T1w.json`, `dwi.bval`)
        if pairs.is_empty()
            && (captures.name("extension").is_none()
                || DATASET_FILES.contains(&&captures["suffix"]))
        {
            return None;
        }

        Some(Self {
            pairs,
            datatype: datatype.map(str::to_string),
            suffix: captures["suffix"].to_string(),
            extension: captures
                .name("extension")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = normalize_extension(extension);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub")
    }

    pub fn session(&self) -> Option<&str> {
        self.get("ses")
    }

    pub fn task(&self) -> Option<&str> {
        self.get("task")
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// True when every key/value pair here also appears in `other`
    pub fn is_subset_of(&self, other: &Entities) -> bool {
        self.pairs
            .iter()
            .all(|(k, v)| other.get(k) == Some(v.as_str()))
    }

    /// Canonical filename for these entities
    pub fn filename(&self) -> String {
        let mut name: Vec<String> = self.pairs.iter().map(|(k, v)| format!("{k}-{v}")).collect();
        name.push(self.suffix.clone());
        format!("{}{}", name.join("_"), self.extension)
    }
}
