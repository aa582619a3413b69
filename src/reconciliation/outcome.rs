//! Check identifiers and results

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::*;

/// The two plausibility checks run against every end-of-day snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// End-of-day of day D against the first intraday snapshot of day D+1
    PreviousDay,
    /// End-of-day of day D against the last intraday snapshot of day D
    LastIntraday,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::PreviousDay => "previous_day",
            CheckKind::LastIntraday => "last_intraday",
        }
    }

    /// Human readable description used in log lines
    pub fn description(&self) -> &'static str {
        match self {
            CheckKind::PreviousDay => {
                "end-of-day values of the previous day against the first intraday values"
            }
            CheckKind::LastIntraday => "end-of-day values against the last intraday values",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one plausibility check.
///
/// An unmatched record is a business finding, not an error: `matched` is true
/// only when both unmatched lists are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: CheckKind,
    /// Intraday snapshot time the check compared against
    pub cutover: NaiveTime,
    pub matched: bool,
    /// Number of end-of-day records that found a counterpart
    pub matched_count: usize,
    pub unmatched_eod: Vec<MarginRecord>,
    /// Eligible intraday records without an end-of-day counterpart
    pub unmatched_intraday: Vec<IntradayRecord>,
}

impl CheckOutcome {
    pub(crate) fn new(
        check: CheckKind,
        cutover: NaiveTime,
        matched_count: usize,
        unmatched_eod: Vec<MarginRecord>,
        unmatched_intraday: Vec<IntradayRecord>,
    ) -> Self {
        Self {
            check,
            cutover,
            matched: unmatched_eod.is_empty() && unmatched_intraday.is_empty(),
            matched_count,
            unmatched_eod,
            unmatched_intraday,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    /// The `(matched, unmatched_eod)` view of the outcome
    pub fn as_pair(&self) -> (bool, &[MarginRecord]) {
        (self.matched, &self.unmatched_eod)
    }

    pub fn into_pair(self) -> (bool, Vec<MarginRecord>) {
        (self.matched, self.unmatched_eod)
    }

    pub fn unmatched_total(&self) -> usize {
        self.unmatched_eod.len() + self.unmatched_intraday.len()
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matched {
            write!(
                f,
                "{} check passed at {}: {} records matched",
                self.check, self.cutover, self.matched_count
            )
        } else {
            write!(
                f,
                "{} check failed at {}: {} end-of-day and {} intraday records unmatched",
                self.check,
                self.cutover,
                self.unmatched_eod.len(),
                self.unmatched_intraday.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    #[test]
    fn test_outcome_requires_both_sides_empty() {
        let cutover = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let intraday = IntradayRecord::new(
            NaiveDate::from_ymd_opt(2020, 5, 12).unwrap(),
            cutover,
            "Bank 1",
            "A1",
            "SPAN",
            BigDecimal::from(5),
        );

        let outcome = CheckOutcome::new(CheckKind::PreviousDay, cutover, 3, vec![], vec![intraday]);
        assert!(!outcome.is_matched());
        let (matched, unmatched_eod) = outcome.as_pair();
        assert!(!matched);
        assert!(unmatched_eod.is_empty());
        assert_eq!(outcome.unmatched_total(), 1);

        let clean = CheckOutcome::new(CheckKind::PreviousDay, cutover, 3, vec![], vec![]);
        assert!(clean.is_matched());
        assert_eq!(
            clean.to_string(),
            "previous_day check passed at 08:00:00: 3 records matched"
        );
    }
}
