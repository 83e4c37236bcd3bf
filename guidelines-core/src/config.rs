//! Audit configuration and discovery
//!
//! Settings come from, in increasing priority: built-in defaults, the user
//! configuration file (`<config dir>/bids-guidelines/config.yml`), an explicit
//! `--config` file, and command-line flags.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::GuidelineCatalog;
use crate::engine::Standard;
use crate::error::{GuidelineError, Result};

const CONFIG_FILE: &str = "config.yml";

fn default_exclude() -> Vec<String> {
    ["derivatives", "sourcedata", "code", "stimuli"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Settings for one audit run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Guideline standard to check against
    pub standard: Standard,

    /// Catalog file overriding the built-in catalog
    pub catalog: Option<PathBuf>,

    /// Top-level dataset directories the indexer skips
    pub exclude: Vec<String>,

    /// Treat the input directory as a collection of datasets
    pub batch: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            standard: Standard::default(),
            catalog: None,
            exclude: default_exclude(),
            batch: false,
        }
    }
}

impl AuditConfig {
    /// Platform path of the user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bids-guidelines").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Resolve configuration: explicit file, then user file, then defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::user_config_path() {
            Some(path) if path.exists() => {
                info!("Using configuration from {:?}", path);
                Self::load(&path)
            }
            _ => {
                debug!("No configuration file found - using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load a YAML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuidelineError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&content).map_err(|e| {
            GuidelineError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml_ng::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content)
    }

    /// Load the configured catalog, or the built-in one for the standard
    pub fn load_catalog(&self) -> Result<GuidelineCatalog> {
        match &self.catalog {
            Some(path) => GuidelineCatalog::load(path),
            None => GuidelineCatalog::builtin(self.standard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.standard, Standard::Cobidas);
        assert_eq!(config.catalog, None);
        assert!(config.exclude.contains(&"derivatives".to_string()));
        assert!(!config.batch);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AuditConfig::from_yaml_str("batch: true\n").unwrap();
        assert!(config.batch);
        assert_eq!(config.standard, Standard::Cobidas);
        assert_eq!(config.exclude, default_exclude());
    }

    #[test]
    fn test_standard_names_in_yaml() {
        let config = AuditConfig::from_yaml_str("standard: CRED-nf\nexclude: []\n").unwrap();
        assert_eq!(config.standard, Standard::CredNf);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = AuditConfig::discover(Some(&dir.path().join("missing.yml"))).unwrap_err();
        assert!(matches!(err, GuidelineError::Config(_)));
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "standard: COBIDAS\ncatalog: /tmp/catalog.yaml\n").unwrap();

        let config = AuditConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.catalog, Some(PathBuf::from("/tmp/catalog.yaml")));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "standard: [not, a, standard]\n").unwrap();

        let err = AuditConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_builtin_catalog_follows_standard() {
        let config = AuditConfig::default();
        assert!(config.load_catalog().unwrap().contains("D02.02.01.00.00.01"));

        let claim = AuditConfig {
            standard: Standard::Claim,
            ..AuditConfig::default()
        };
        assert!(matches!(
            claim.load_catalog(),
            Err(GuidelineError::NotImplemented { .. })
        ));
    }
}
