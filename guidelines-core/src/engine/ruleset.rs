//! Rule sets - the registered rules of one guideline standard

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use super::rule::Rule;
use crate::catalog::GuidelineCatalog;
use crate::error::{GuidelineError, Result};
use crate::guidelines;

/// Guideline standards a dataset can be audited against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Standard {
    #[default]
    #[serde(rename = "COBIDAS", alias = "cobidas")]
    Cobidas,
    #[serde(rename = "CLAIM", alias = "claim")]
    Claim,
    #[serde(rename = "CRED-nf", alias = "cred-nf")]
    CredNf,
}

impl Standard {
    pub const ALL: [Standard; 3] = [Standard::Cobidas, Standard::Claim, Standard::CredNf];

    pub fn name(self) -> &'static str {
        match self {
            Standard::Cobidas => "COBIDAS",
            Standard::Claim => "CLAIM",
            Standard::CredNf => "CRED-nf",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Standard {
    type Err = GuidelineError;

    fn from_str(s: &str) -> Result<Self> {
        Standard::ALL
            .into_iter()
            .find(|standard| standard.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                GuidelineError::Config(format!(
                    "unknown guideline standard '{s}' (expected one of COBIDAS, CLAIM, CRED-nf)"
                ))
            })
    }
}

/// Immutable, identifier-ordered collection of rules for one standard
pub struct RuleSet {
    standard: Standard,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Build a rule set, checking every rule against the catalog
    pub fn new(
        standard: Standard,
        mut rules: Vec<Box<dyn Rule>>,
        catalog: &GuidelineCatalog,
    ) -> Result<Self> {
        let mut seen = HashSet::new();

        for rule in &rules {
            if !seen.insert(rule.id().to_string()) {
                return Err(GuidelineError::DuplicateRule {
                    rule: rule.id().to_string(),
                });
            }
            if !catalog.contains(rule.id()) {
                return Err(GuidelineError::UnknownGuideline {
                    rule: rule.id().to_string(),
                });
            }
        }

        rules.sort_by(|a, b| a.id().cmp(b.id()));
        debug!("Registered {} {} rules", rules.len(), standard);

        Ok(Self { standard, rules })
    }

    /// The registered rules of a standard
    pub fn for_standard(standard: Standard, catalog: &GuidelineCatalog) -> Result<Self> {
        let rules = match standard {
            Standard::Cobidas => guidelines::cobidas::rules(),
            other => {
                return Err(GuidelineError::NotImplemented {
                    standard: other.to_string(),
                })
            }
        };

        let ruleset = Self::new(standard, rules, catalog)?;
        info!("Loaded {} rule set with {} rules", standard, ruleset.len());
        Ok(ruleset)
    }

    pub fn standard(&self) -> Standard {
        self.standard
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .binary_search_by(|r| r.id().cmp(id))
            .ok()
            .map(|idx| self.rules[idx].as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("standard", &self.standard)
            .field("rules", &self.ids())
            .finish()
    }
}
