//! Rule contract and the declarative metadata rule
//!
//! Most guideline items reduce to "for every file of some kind, is this
//! metadata present?". [`MetadataRule`] captures that pattern as data: which
//! files are units of applicability ([`Scope`]) and which checks are counted
//! per unit ([`Check`]).

use serde_json::Value;
use tracing::trace;

use super::result::{RuleResult, Tally};
use crate::dataset::{BidsFile, DatasetIndex, FileFilter, Metadata};
use crate::error::Result;

/// One checklist item evaluated against a dataset
pub trait Rule: Send + Sync {
    /// Guideline identifier; must exist in the catalog
    fn id(&self) -> &str;

    /// Count the rule's checks over the dataset
    ///
    /// A panic is caught by the evaluator and reported like an `Err`.
    fn evaluate(&self, index: &dyn DatasetIndex) -> Result<RuleResult>;

    /// Short description of what the rule looks at
    fn scope(&self) -> String {
        String::new()
    }
}

/// Which files are units of applicability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every file matching the filter
    Files(FileFilter),
    /// For each task in the dataset, every file of that task matching the filter
    PerTask(FileFilter),
}

impl Scope {
    fn units(&self, index: &dyn DatasetIndex) -> Result<Vec<BidsFile>> {
        match self {
            Scope::Files(filter) => index.find_files(filter),
            Scope::PerTask(filter) => {
                let mut units = Vec::new();
                for task in index.list_tasks()? {
                    units.extend(index.find_files(&filter.clone().task(&task))?);
                }
                Ok(units)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Scope::Files(filter) => filter.describe(),
            Scope::PerTask(filter) => format!("per task: {}", filter.describe()),
        }
    }
}

/// A counted check applied to one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// One check: the field is present
    Present(String),
    /// One check: every field is present
    AllPresent(Vec<String>),
    /// One check per field
    EachPresent(Vec<String>),
    /// One check: at least one field is present
    AnyPresent(Vec<String>),
    /// One check: a sibling file with the overridden suffix/extension exists
    Sibling {
        suffix: Option<String>,
        extension: String,
    },
    /// Nested checks apply only when `field` holds one of `any_of`
    When {
        field: String,
        any_of: Vec<String>,
        then: Vec<Check>,
    },
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Check {
    pub fn present(field: &str) -> Self {
        Check::Present(field.to_string())
    }

    pub fn all_present(names: &[&str]) -> Self {
        Check::AllPresent(fields(names))
    }

    pub fn each_present(names: &[&str]) -> Self {
        Check::EachPresent(fields(names))
    }

    pub fn any_present(names: &[&str]) -> Self {
        Check::AnyPresent(fields(names))
    }

    pub fn sibling(suffix: Option<&str>, extension: &str) -> Self {
        Check::Sibling {
            suffix: suffix.map(str::to_string),
            extension: extension.to_string(),
        }
    }

    pub fn when(field: &str, any_of: &[&str], then: Vec<Check>) -> Self {
        Check::When {
            field: field.to_string(),
            any_of: fields(any_of),
            then,
        }
    }

    fn apply(
        &self,
        index: &dyn DatasetIndex,
        file: &BidsFile,
        metadata: &Metadata,
        tally: &mut Tally,
    ) -> Result<()> {
        match self {
            Check::Present(field) => tally.record(has(metadata, field)),
            Check::AllPresent(names) => tally.record(names.iter().all(|f| has(metadata, f))),
            Check::EachPresent(names) => {
                for field in names {
                    tally.record(has(metadata, field));
                }
            }
            Check::AnyPresent(names) => tally.record(names.iter().any(|f| has(metadata, f))),
            Check::Sibling { suffix, extension } => {
                let mut entities = file.entities().clone().with_extension(extension);
                if let Some(suffix) = suffix {
                    entities = entities.with_suffix(suffix);
                }
                tally.record(index.resolve_sibling(&entities)?.is_some());
            }
            Check::When {
                field,
                any_of,
                then,
            } => {
                let in_scope = metadata
                    .get(field)
                    .and_then(Value::as_str)
                    .map_or(false, |v| any_of.iter().any(|a| a == v));

                if in_scope {
                    for check in then {
                        check.apply(index, file, metadata, tally)?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Present and not `null`
fn has(metadata: &Metadata, field: &str) -> bool {
    metadata.get(field).map_or(false, |v| !v.is_null())
}

/// Declarative rule: a scope of files and the checks counted for each
#[derive(Debug, Clone)]
pub struct MetadataRule {
    id: String,
    scope: Scope,
    checks: Vec<Check>,
}

impl MetadataRule {
    pub fn new(id: &str, scope: Scope) -> Self {
        Self {
            id: id.to_string(),
            scope,
            checks: Vec::new(),
        }
    }

    /// Builder: add a check counted for every unit
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

impl Rule for MetadataRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, index: &dyn DatasetIndex) -> Result<RuleResult> {
        let mut tally = Tally::new();

        for file in self.scope.units(index)? {
            let metadata = index.metadata(&file)?;
            let mut unit = Tally::new();

            for check in &self.checks {
                check.apply(index, &file, &metadata, &mut unit)?;
            }

            trace!(
                rule = %self.id,
                file = ?file.path(),
                satisfied = unit.tally(),
                checked = unit.total(),
                "Evaluated unit"
            );
            tally.merge(unit);
        }

        Ok(tally.finish())
    }

    fn scope(&self) -> String {
        self.scope.describe()
    }
}
