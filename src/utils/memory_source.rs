//! In-memory collaborators for testing and development

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory margin source for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryMarginSource {
    end_of_day: Arc<RwLock<Vec<EndOfDayRow>>>,
    intraday: Arc<RwLock<Vec<IntradayRow>>>,
}

impl MemoryMarginSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source holding the given rows
    pub fn with_rows(end_of_day: Vec<EndOfDayRow>, intraday: Vec<IntradayRow>) -> Self {
        Self {
            end_of_day: Arc::new(RwLock::new(end_of_day)),
            intraday: Arc::new(RwLock::new(intraday)),
        }
    }

    /// Source seeded with one clearing day: EOD of 2020-05-11 plus the
    /// 18:00 and 19:00 snapshots of that day and the 08:00 and 09:00
    /// snapshots of 2020-05-12
    pub fn with_sample_data() -> Self {
        Self::with_rows(sample_end_of_day(), sample_intraday())
    }

    /// Source seeded with the reference clearing day of the plausibility
    /// check, see [`reference_end_of_day`]
    pub fn with_reference_data() -> Self {
        Self::with_rows(reference_end_of_day(), reference_intraday())
    }

    pub fn insert_end_of_day(&self, row: EndOfDayRow) -> ReconciliationResult<()> {
        self.end_of_day
            .write()
            .map_err(|e| ReconciliationError::Source(e.to_string()))?
            .push(row);
        Ok(())
    }

    pub fn insert_intraday(&self, row: IntradayRow) -> ReconciliationResult<()> {
        self.intraday
            .write()
            .map_err(|e| ReconciliationError::Source(e.to_string()))?
            .push(row);
        Ok(())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconciliationResult<()> {
        self.end_of_day
            .write()
            .map_err(|e| ReconciliationError::Source(e.to_string()))?
            .clear();
        self.intraday
            .write()
            .map_err(|e| ReconciliationError::Source(e.to_string()))?
            .clear();
        Ok(())
    }
}

#[async_trait]
impl MarginSource for MemoryMarginSource {
    async fn fetch_end_of_day(&self) -> ReconciliationResult<Vec<EndOfDayRow>> {
        self.end_of_day
            .read()
            .map(|rows| rows.clone())
            .map_err(|e| ReconciliationError::Source(e.to_string()))
    }

    async fn fetch_intraday(&self) -> ReconciliationResult<Vec<IntradayRow>> {
        self.intraday
            .read()
            .map(|rows| rows.clone())
            .map_err(|e| ReconciliationError::Source(e.to_string()))
    }
}

/// End-of-day snapshot of 2020-05-11
pub fn sample_end_of_day() -> Vec<EndOfDayRow> {
    vec![
        EndOfDayRow::new("2020-05-11", "Bank 1", "A1", "SPAN", 3212.2),
        EndOfDayRow::new("2020-05-11", "Bank 1", "A1", "IMSM", 837.1),
        EndOfDayRow::new("2020-05-11", "Bank 1", "A2", "SPAN", 8963.3),
        EndOfDayRow::new("2020-05-11", "Bank 1", "A2", "IMSM", 76687.9),
        EndOfDayRow::new("2020-05-11", "Bank 2", "A1", "SPAN", 821.4),
        EndOfDayRow::new("2020-05-11", "Bank 2", "A1", "IMSM", 8766.4),
    ]
}

/// Intraday snapshots of 2020-05-11 and 2020-05-12 consistent with
/// [`sample_end_of_day`]
pub fn sample_intraday() -> Vec<IntradayRow> {
    let snapshot = |date: &str, time: &str, margins: [f64; 6]| {
        let positions = [
            ("Bank 1", "A1", "SPAN"),
            ("Bank 1", "A1", "IMSM"),
            ("Bank 1", "A2", "SPAN"),
            ("Bank 1", "A2", "IMSM"),
            ("Bank 2", "A1", "SPAN"),
            ("Bank 2", "A1", "IMSM"),
        ];
        positions
            .into_iter()
            .zip(margins)
            .map(|((clearing, account, margin_type), margin)| {
                IntradayRow::new(date, time, clearing, account, margin_type, margin)
            })
            .collect::<Vec<_>>()
    };

    let closing = [3212.2, 837.1, 8963.3, 76687.9, 821.4, 8766.4];
    let mut rows = snapshot(
        "2020-05-11",
        "18:00:00",
        [2882.2, 988.1, 788.3, 908.9, 123.4, 8326.4],
    );
    rows.extend(snapshot("2020-05-11", "19:00:00", closing));
    rows.extend(snapshot("2020-05-12", "08:00:00", closing));
    rows.extend(snapshot(
        "2020-05-12",
        "09:00:00",
        [3133.9, 137.1, 2963.3, 74687.9, 811.4, 8366.4],
    ));
    rows
}

/// Reference end-of-day snapshot of 2020-05-11.
///
/// Bank 2 / A1 reports SPAN twice and no IMSM, so the position is duplicated
/// and the last intraday snapshot of the day disagrees with it.
pub fn reference_end_of_day() -> Vec<EndOfDayRow> {
    let mut rows = sample_end_of_day();
    if let Some(row) = rows.last_mut() {
        row.margin_type = "SPAN".to_string();
    }
    rows
}

/// Reference intraday snapshots matching [`reference_end_of_day`] at 08:00:00
/// on 2020-05-12 but not at 19:00:00 on 2020-05-11
pub fn reference_intraday() -> Vec<IntradayRow> {
    let mut rows = sample_intraday();
    let duplicated = rows
        .iter_mut()
        .find(|r| r.time == "08:00:00" && r.margin == 8766.4);
    if let Some(row) = duplicated {
        row.margin_type = "SPAN".to_string();
    }
    rows
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub label: String,
    pub records: Vec<serde_json::Value>,
}

/// Notifier that keeps every notification in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentNotification>>>,
    fail_deliveries: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier that records every attempt but reports delivery failure
    pub fn failing() -> Self {
        Self {
            fail_deliveries: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .read()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, records: &[serde_json::Value], label: &str) -> bool {
        let Ok(mut sent) = self.sent.write() else {
            return false;
        };
        sent.push(SentNotification {
            label: label.to_string(),
            records: records.to_vec(),
        });
        !self.fail_deliveries
    }
}

/// Check logger that keeps every entry in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckLogger {
    entries: Arc<RwLock<Vec<(LogLevel, String)>>>,
}

impl MemoryCheckLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl CheckLogger for MemoryCheckLogger {
    fn log(&self, message: &str, level: LogLevel) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push((level, message.to_string()));
        }
    }
}
