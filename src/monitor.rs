//! Plausibility monitor that fetches snapshots, runs both checks and
//! reports failures to the injected collaborators

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ReconcilerConfig;
use crate::reconciliation::{CheckKind, CheckOutcome, Reconciler};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{find_duplicate_positions, DuplicatePosition};

/// Notification label for end-of-day records without an intraday counterpart
pub const END_OF_DAY_UNMATCHED: &str = "end_of_day_unmatched";
/// Notification label for intraday records without an end-of-day counterpart
pub const INTRADAY_UNMATCHED: &str = "intraday_unmatched";

/// Delivery status of one notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub check: CheckKind,
    pub label: String,
    pub record_count: usize,
    pub delivered: bool,
}

/// Everything one monitor run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorReport {
    pub run_id: Uuid,
    pub started_at: NaiveDateTime,
    pub previous_day: CheckOutcome,
    pub last_intraday: CheckOutcome,
    pub notifications: Vec<NotificationReceipt>,
    /// End-of-day positions reported more than once
    pub duplicate_positions: Vec<DuplicatePosition>,
}

impl MonitorReport {
    /// True when both checks found every record matched
    pub fn all_passed(&self) -> bool {
        self.previous_day.matched && self.last_intraday.matched
    }

    pub fn outcomes(&self) -> [&CheckOutcome; 2] {
        [&self.previous_day, &self.last_intraday]
    }

    /// Notifications the notifier could not deliver
    pub fn failed_notifications(&self) -> impl Iterator<Item = &NotificationReceipt> {
        self.notifications.iter().filter(|n| !n.delivered)
    }
}

/// Runs the plausibility checks against a margin source
pub struct PlausibilityMonitor<S: MarginSource, N: Notifier, L: CheckLogger> {
    source: S,
    notifier: N,
    logger: L,
    config: ReconcilerConfig,
}

impl<S: MarginSource, N: Notifier, L: CheckLogger> PlausibilityMonitor<S, N, L> {
    /// Create a monitor with the default reconciler configuration
    pub fn new(source: S, notifier: N, logger: L) -> Self {
        Self::with_config(source, notifier, logger, ReconcilerConfig::default())
    }

    pub fn with_config(source: S, notifier: N, logger: L, config: ReconcilerConfig) -> Self {
        Self {
            source,
            notifier,
            logger,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Fetch both snapshots, run both checks and report failures.
    ///
    /// Unusable data is returned as an error before any check runs. Failed
    /// checks are logged and notified; notification failures are recorded in
    /// the report and never change the check outcomes.
    pub async fn run(&self) -> ReconciliationResult<MonitorReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now().naive_utc();

        let end_of_day = self.source.fetch_end_of_day().await?;
        let intraday = self.source.fetch_intraday().await?;
        info!(
            %run_id,
            end_of_day = end_of_day.len(),
            intraday = intraday.len(),
            "Starting plausibility run"
        );

        let reconciler = Reconciler::with_config(&end_of_day, &intraday, self.config.clone())?;

        let duplicate_positions = find_duplicate_positions(reconciler.end_of_day());
        for duplicate in &duplicate_positions {
            warn!(
                %run_id,
                date = %duplicate.date,
                clearing_number = %duplicate.clearing_number,
                account = %duplicate.account,
                margin_type = %duplicate.margin_type,
                occurrences = duplicate.occurrences,
                "Duplicate end-of-day position"
            );
        }

        let previous_day = reconciler.check_previous_day();
        let last_intraday = reconciler.check_last_intraday();

        let mut notifications = Vec::new();
        for outcome in [&previous_day, &last_intraday] {
            info!(%run_id, "{}", outcome);
            if !outcome.matched {
                notifications.extend(self.report_failure(outcome).await?);
            }
        }

        Ok(MonitorReport {
            run_id,
            started_at,
            previous_day,
            last_intraday,
            notifications,
            duplicate_positions,
        })
    }

    async fn report_failure(
        &self,
        outcome: &CheckOutcome,
    ) -> ReconciliationResult<Vec<NotificationReceipt>> {
        let mut receipts = Vec::new();

        if !outcome.unmatched_eod.is_empty() {
            let records = to_mappings(&outcome.unmatched_eod)?;
            let receipt = self
                .send(outcome.check, END_OF_DAY_UNMATCHED, &records)
                .await;
            receipts.push(receipt);
        }
        if !outcome.unmatched_intraday.is_empty() {
            let records = to_mappings(&outcome.unmatched_intraday)?;
            let receipt = self
                .send(outcome.check, INTRADAY_UNMATCHED, &records)
                .await;
            receipts.push(receipt);
        }

        Ok(receipts)
    }

    async fn send(
        &self,
        check: CheckKind,
        label: &str,
        records: &[serde_json::Value],
    ) -> NotificationReceipt {
        let delivered = self.notifier.notify(records, label).await;
        if !delivered {
            warn!(check = %check, label, "Notification delivery failed");
        }

        let payload = serde_json::Value::Array(records.to_vec());
        self.logger.log(
            &format!(
                "{} check failed ({}), {}: {}",
                check,
                check.description(),
                label,
                payload
            ),
            LogLevel::Error,
        );

        NotificationReceipt {
            check,
            label: label.to_string(),
            record_count: records.len(),
            delivered,
        }
    }
}

/// Serialize records as column-name mappings
fn to_mappings<T: Serialize>(records: &[T]) -> ReconciliationResult<Vec<serde_json::Value>> {
    records
        .iter()
        .map(|record| {
            serde_json::to_value(record)
                .map_err(|e| ReconciliationError::Serialization(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryCheckLogger, MemoryMarginSource, RecordingNotifier};

    #[tokio::test]
    async fn test_clean_run_sends_nothing() {
        let notifier = RecordingNotifier::new();
        let logger = MemoryCheckLogger::new();
        let monitor = PlausibilityMonitor::new(
            MemoryMarginSource::with_sample_data(),
            notifier.clone(),
            logger.clone(),
        );

        let report = monitor.run().await.unwrap();
        assert!(report.all_passed());
        assert!(report.notifications.is_empty());
        assert!(notifier.sent().is_empty());
        assert!(logger.entries().is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_is_an_error() {
        let monitor = PlausibilityMonitor::new(
            MemoryMarginSource::new(),
            RecordingNotifier::new(),
            MemoryCheckLogger::new(),
        );
        assert!(matches!(
            monitor.run().await,
            Err(ReconciliationError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_to_mappings_uses_column_names() {
        let record = MarginRecord::new(
            chrono::NaiveDate::from_ymd_opt(2020, 5, 11).unwrap(),
            "Bank 1",
            "A1",
            "SPAN",
            bigdecimal::BigDecimal::from(10),
        );
        let mappings = to_mappings(&[record]).unwrap();
        assert_eq!(mappings.len(), 1);
        let object = mappings[0].as_object().unwrap();
        let columns = [
            "date",
            "clearing_number",
            "account",
            "margin_type",
            "margin",
        ];
        for column in columns {
            assert!(object.contains_key(column), "missing column {}", column);
        }
        assert_eq!(object["margin_type"], "SPAN");
        assert_eq!(object["date"], "2020-05-11");
    }

    #[test]
    fn test_to_mappings_surfaces_serialization_errors() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut by_position = HashMap::new();
        by_position.insert((1, 2), "SPAN");
        assert!(matches!(
            to_mappings(&[by_position]),
            Err(ReconciliationError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_reference_data_flags_duplicate_position() {
        let notifier = RecordingNotifier::new();
        let monitor = PlausibilityMonitor::new(
            MemoryMarginSource::with_reference_data(),
            notifier.clone(),
            MemoryCheckLogger::new(),
        );

        let report = monitor.run().await.unwrap();
        assert!(report.previous_day.matched);
        assert!(!report.last_intraday.matched);

        assert_eq!(report.duplicate_positions.len(), 1);
        let duplicate = &report.duplicate_positions[0];
        assert_eq!(duplicate.date.to_string(), "2020-05-11");
        assert_eq!(duplicate.clearing_number, "Bank 2");
        assert_eq!(duplicate.account, "A1");
        assert_eq!(duplicate.margin_type, MarginType::Span);
        assert_eq!(duplicate.occurrences, 2);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].records[0]["margin_type"], "SPAN");
        assert_eq!(sent[1].records[0]["margin_type"], "IMSM");
    }
}
