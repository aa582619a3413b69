//! The reconciler: normalized snapshots plus the two plausibility checks

use tracing::debug;

use crate::config::ReconcilerConfig;
use crate::reconciliation::matching::{outer_join, Cutover};
use crate::reconciliation::outcome::{CheckKind, CheckOutcome};
use crate::types::*;
use crate::utils::validation::{normalize_end_of_day, normalize_intraday};

/// Reconciles an end-of-day snapshot against intraday snapshots.
///
/// Inputs are validated and normalized once at construction; every check is
/// a pure function of them, so checks can run in any order or concurrently.
#[derive(Debug, Clone)]
pub struct Reconciler {
    end_of_day: Vec<MarginRecord>,
    intraday: Vec<IntradayRecord>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Normalize raw rows with the default cutover times
    pub fn new(end_of_day: &[EndOfDayRow], intraday: &[IntradayRow]) -> ReconciliationResult<Self> {
        Self::with_config(end_of_day, intraday, ReconcilerConfig::default())
    }

    /// Normalize raw rows with custom configuration
    pub fn with_config(
        end_of_day: &[EndOfDayRow],
        intraday: &[IntradayRow],
        config: ReconcilerConfig,
    ) -> ReconciliationResult<Self> {
        ensure_not_empty(end_of_day.len(), intraday.len())?;

        let end_of_day = end_of_day
            .iter()
            .enumerate()
            .map(|(index, row)| normalize_end_of_day(index, row))
            .collect::<ReconciliationResult<Vec<_>>>()?;
        let intraday = intraday
            .iter()
            .enumerate()
            .map(|(index, row)| normalize_intraday(index, row))
            .collect::<ReconciliationResult<Vec<_>>>()?;

        debug!(
            end_of_day = end_of_day.len(),
            intraday = intraday.len(),
            "Normalized margin snapshots"
        );

        Self::from_records(end_of_day, intraday, config)
    }

    /// Build from records that are already normalized
    pub fn from_records(
        end_of_day: Vec<MarginRecord>,
        intraday: Vec<IntradayRecord>,
        config: ReconcilerConfig,
    ) -> ReconciliationResult<Self> {
        ensure_not_empty(end_of_day.len(), intraday.len())?;
        config.validate()?;

        Ok(Self {
            end_of_day,
            intraday,
            config,
        })
    }

    pub fn end_of_day(&self) -> &[MarginRecord] {
        &self.end_of_day
    }

    pub fn intraday(&self) -> &[IntradayRecord] {
        &self.intraday
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Check end-of-day values against the first intraday snapshot of the following day
    pub fn check_previous_day(&self) -> CheckOutcome {
        self.check(CheckKind::PreviousDay)
    }

    /// Check end-of-day values against the last intraday snapshot of the same day
    pub fn check_last_intraday(&self) -> CheckOutcome {
        self.check(CheckKind::LastIntraday)
    }

    /// Run a single check
    pub fn check(&self, kind: CheckKind) -> CheckOutcome {
        let cutover = self.cutover(kind);
        let joined = outer_join(
            &self.end_of_day,
            &self.intraday,
            cutover,
            self.config.match_policy,
        );

        let outcome = CheckOutcome::new(
            kind,
            cutover.time,
            joined.matched_count,
            joined.unmatched_eod.into_iter().cloned().collect(),
            joined.unmatched_intraday.into_iter().cloned().collect(),
        );

        debug!(
            check = %kind,
            matched = outcome.matched,
            unmatched_eod = outcome.unmatched_eod.len(),
            unmatched_intraday = outcome.unmatched_intraday.len(),
            "Plausibility check evaluated"
        );

        outcome
    }

    /// Cutover a check compares against
    pub fn cutover(&self, kind: CheckKind) -> Cutover {
        match kind {
            CheckKind::PreviousDay => Cutover {
                time: self.config.first_snapshot,
                day_offset: self.config.previous_day_offset_days,
            },
            CheckKind::LastIntraday => Cutover {
                time: self.config.last_snapshot,
                day_offset: 0,
            },
        }
    }
}

fn ensure_not_empty(end_of_day: usize, intraday: usize) -> ReconciliationResult<()> {
    if end_of_day == 0 {
        return Err(ReconciliationError::EmptyInput {
            side: RecordSide::EndOfDay,
        });
    }
    if intraday == 0 {
        return Err(ReconciliationError::EmptyInput {
            side: RecordSide::Intraday,
        });
    }
    Ok(())
}
