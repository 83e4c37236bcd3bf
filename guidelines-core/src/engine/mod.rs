//! Guideline evaluation engine
//!
//! Rules produce [`RuleResult`]s, a [`RuleSet`] groups the rules of one
//! standard, and the [`Evaluator`] runs them and aggregates a dataset score.

pub mod evaluator;
pub mod result;
pub mod rule;
pub mod ruleset;


pub use evaluator::{DatasetEvaluation, Evaluator, ReportLine};
pub use result::{grade, percent, rate, RuleResult, Status, Tally};
pub use rule::{Check, MetadataRule, Rule, Scope};
pub use ruleset::{RuleSet, Standard};
