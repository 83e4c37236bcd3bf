//! Rule results and their scoring
//!
//! A [`RuleResult`] is the `tally/total` count produced by one rule. Its
//! status and success rate are derived from the counts at construction and
//! never change afterwards.

use serde::Serialize;
use std::fmt;

use crate::error::{GuidelineError, Result};

/// Compliance status of one rule on one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Nothing in the dataset is governed by the rule
    NotApplicable,
    Failure,
    PartialSuccess,
    CompleteSuccess,
}

impl Status {
    pub fn is_applicable(self) -> bool {
        self != Status::NotApplicable
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NotApplicable => write!(f, "not applicable"),
            Status::Failure => write!(f, "complete failure"),
            Status::PartialSuccess => write!(f, "partial success"),
            Status::CompleteSuccess => write!(f, "complete success"),
        }
    }
}

/// Status for a tally out of a total
pub fn grade(tally: u64, total: u64) -> Status {
    if total == 0 {
        Status::NotApplicable
    } else if tally == 0 {
        Status::Failure
    } else if tally >= total {
        Status::CompleteSuccess
    } else {
        Status::PartialSuccess
    }
}

/// Fraction of satisfied checks, `0.0` when nothing was checked
pub fn rate(tally: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (tally.min(total) as f64) / (total as f64)
    }
}

/// Integer percentage for display, ties rounded to even
pub fn percent(rate: f64) -> u32 {
    (rate * 100.0).round_ties_even().clamp(0.0, 100.0) as u32
}

/// Outcome of evaluating one rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleResult {
    tally: u64,
    total: u64,
    status: Status,
    success_rate: f64,
}

impl RuleResult {
    pub fn new(tally: u64, total: u64) -> Result<Self> {
        if tally > total {
            return Err(GuidelineError::InvalidTally { tally, total });
        }

        Ok(Self {
            tally,
            total,
            status: grade(tally, total),
            success_rate: rate(tally, total),
        })
    }

    /// The `(0, 0)` result of a rule with nothing to measure
    pub fn not_applicable() -> Self {
        Tally::default().finish()
    }

    pub fn tally(&self) -> u64 {
        self.tally
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn percent(&self) -> u32 {
        percent(self.success_rate)
    }

    pub fn is_applicable(&self) -> bool {
        self.status.is_applicable()
    }
}

/// Accumulator for a rule's checks; tally can never exceed total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    tally: u64,
    total: u64,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one binary check
    pub fn record(&mut self, satisfied: bool) {
        self.total += 1;
        if satisfied {
            self.tally += 1;
        }
    }

    pub fn merge(&mut self, other: Tally) {
        self.tally += other.tally;
        self.total += other.total;
    }

    pub fn tally(&self) -> u64 {
        self.tally
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn finish(self) -> RuleResult {
        RuleResult {
            tally: self.tally,
            total: self.total,
            status: grade(self.tally, self.total),
            success_rate: rate(self.tally, self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grade_table() {
        assert_eq!(grade(0, 0), Status::NotApplicable);
        assert_eq!(grade(0, 3), Status::Failure);
        assert_eq!(grade(3, 3), Status::CompleteSuccess);
        assert_eq!(grade(1, 1), Status::CompleteSuccess);
        assert_eq!(grade(1, 3), Status::PartialSuccess);
        assert_eq!(grade(2, 3), Status::PartialSuccess);
    }

    #[test]
    fn test_rate() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(1, 2), 0.5);
        assert_eq!(rate(4, 4), 1.0);
        assert_eq!(rate(0, 7), 0.0);
    }

    #[test]
    fn test_rate_stays_in_unit_interval() {
        for total in 0..20u64 {
            for tally in 0..=total {
                let r = rate(tally, total);
                assert!((0.0..=1.0).contains(&r), "rate({tally}, {total}) = {r}");
                if total > 0 {
                    assert_eq!(r == 1.0, grade(tally, total) == Status::CompleteSuccess);
                }
            }
        }
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0.5), 50);
        assert_eq!(percent(1.0), 100);
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(2.0 / 3.0), 67);
        assert_eq!(percent(1.0 / 3.0), 33);
        // 12.5 is exact in binary; ties go to the even neighbour
        assert_eq!(percent(0.125), 12);
        assert_eq!(percent(0.375), 38);
    }

    #[test]
    fn test_result_rejects_tally_above_total() {
        let err = RuleResult::new(3, 2).unwrap_err();
        assert!(matches!(err, GuidelineError::InvalidTally { tally: 3, total: 2 }));
    }

    #[test]
    fn test_result_derives_status_and_rate() {
        let result = RuleResult::new(1, 2).unwrap();
        assert_eq!(result.status(), Status::PartialSuccess);
        assert_eq!(result.success_rate(), 0.5);
        assert_eq!(result.percent(), 50);
        assert!(result.is_applicable());

        let na = RuleResult::not_applicable();
        assert_eq!(na.status(), Status::NotApplicable);
        assert_eq!(na.success_rate(), 0.0);
        assert!(!na.is_applicable());
    }

    #[test]
    fn test_tally_accumulates() {
        let mut tally = Tally::new();
        tally.record(true);
        tally.record(false);

        let mut other = Tally::new();
        other.record(true);
        tally.merge(other);

        let result = tally.finish();
        assert_eq!((result.tally(), result.total()), (2, 3));
        assert_eq!(result.status(), Status::PartialSuccess);
    }

    #[test]
    fn test_status_display_matches_report_wording() {
        assert_eq!(Status::NotApplicable.to_string(), "not applicable");
        assert_eq!(Status::Failure.to_string(), "complete failure");
        assert_eq!(Status::PartialSuccess.to_string(), "partial success");
        assert_eq!(Status::CompleteSuccess.to_string(), "complete success");
    }
}
