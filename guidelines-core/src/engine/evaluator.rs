//! Evaluator - runs a rule set against a dataset and aggregates the results

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

use super::result::{percent, RuleResult};
use super::ruleset::{RuleSet, Standard};
use crate::catalog::GuidelineCatalog;
use crate::dataset::DatasetIndex;
use crate::error::GuidelineError;

/// One report line for an applicable rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub id: String,
    pub tally: u64,
    pub total: u64,
    pub percent: u32,
    pub label: String,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} ({} %) {}",
            self.id, self.tally, self.total, self.percent, self.label
        )
    }
}

/// Every rule outcome for one dataset
#[derive(Debug, Clone)]
pub struct DatasetEvaluation {
    pub standard: Standard,
    /// Results of rules that evaluated, applicable or not
    pub per_rule: BTreeMap<String, RuleResult>,
    /// Rules whose evaluation failed, with the error message
    pub errors: BTreeMap<String, String>,
    /// Number of applicable rules
    pub evaluated_count: usize,
    /// Mean success rate of applicable rules, `None` when there are none
    pub score: Option<f64>,
    labels: BTreeMap<String, String>,
}

impl DatasetEvaluation {
    /// Aggregate collected results
    pub fn from_results(
        standard: Standard,
        per_rule: BTreeMap<String, RuleResult>,
        errors: BTreeMap<String, String>,
        catalog: &GuidelineCatalog,
    ) -> Self {
        let rates: Vec<f64> = per_rule
            .values()
            .filter(|r| r.is_applicable())
            .map(|r| r.success_rate())
            .collect();

        let evaluated_count = rates.len();
        let score = if rates.is_empty() {
            None
        } else {
            Some(rates.iter().sum::<f64>() / evaluated_count as f64)
        };

        let labels = per_rule
            .keys()
            .chain(errors.keys())
            .map(|id| (id.clone(), catalog.label(id).to_string()))
            .collect();

        Self {
            standard,
            per_rule,
            errors,
            evaluated_count,
            score,
            labels,
        }
    }

    /// Applicable results in identifier order
    pub fn applicable(&self) -> impl Iterator<Item = (&str, &RuleResult)> {
        self.per_rule
            .iter()
            .filter(|(_, r)| r.is_applicable())
            .map(|(id, r)| (id.as_str(), r))
    }

    /// Identifiers of rules with nothing to measure
    pub fn not_applicable(&self) -> Vec<&str> {
        self.per_rule
            .iter()
            .filter(|(_, r)| !r.is_applicable())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn label(&self, id: &str) -> &str {
        self.labels.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn score_percent(&self) -> Option<u32> {
        self.score.map(percent)
    }

    /// Formatted lines for every applicable rule
    pub fn report_lines(&self) -> Vec<ReportLine> {
        self.applicable()
            .map(|(id, result)| ReportLine {
                id: id.to_string(),
                tally: result.tally(),
                total: result.total(),
                percent: result.percent(),
                label: self.label(id).to_string(),
            })
            .collect()
    }
}

/// Runs rules with a per-rule failure boundary
pub struct Evaluator<'a> {
    catalog: &'a GuidelineCatalog,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a GuidelineCatalog) -> Self {
        Self { catalog }
    }

    /// Evaluate every rule; a failing or panicking rule is recorded and skipped
    pub fn evaluate_all(&self, ruleset: &RuleSet, index: &dyn DatasetIndex) -> DatasetEvaluation {
        info!(
            "Evaluating {} {} rules against {:?}",
            ruleset.len(),
            ruleset.standard(),
            index.root()
        );

        let mut per_rule = BTreeMap::new();
        let mut errors = BTreeMap::new();

        for rule in ruleset.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(index)))
                .unwrap_or_else(|payload| Err(GuidelineError::Panicked(panic_message(payload))));

            match outcome {
                Ok(result) => {
                    debug!(
                        rule = rule.id(),
                        tally = result.tally(),
                        total = result.total(),
                        status = %result.status(),
                        "Rule evaluated"
                    );
                    per_rule.insert(rule.id().to_string(), result);
                }
                Err(e) => {
                    warn!("Error running check {}: {}", rule.id(), e);
                    errors.insert(rule.id().to_string(), e.to_string());
                }
            }
        }

        let evaluation =
            DatasetEvaluation::from_results(ruleset.standard(), per_rule, errors, self.catalog);

        info!(
            "{} applicable, {} not applicable, {} failed to evaluate",
            evaluation.evaluated_count,
            evaluation.not_applicable().len(),
            evaluation.errors.len()
        );

        evaluation
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
