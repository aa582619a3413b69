//! Collaborator traits for data access, notification and logging

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::*;

/// Source of margin snapshots
///
/// This trait allows the plausibility checks to run against any store
/// (SQL database, CSV export, in-memory, etc.) by implementing these methods.
#[async_trait]
pub trait MarginSource: Send + Sync {
    /// Fetch the end-of-day rows to check
    async fn fetch_end_of_day(&self) -> ReconciliationResult<Vec<EndOfDayRow>>;

    /// Fetch the intraday rows the end-of-day rows are checked against
    async fn fetch_intraday(&self) -> ReconciliationResult<Vec<IntradayRow>>;
}

/// Delivers unmatched records to whoever has to act on them
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `records` under `label`; returns whether delivery succeeded
    async fn notify(&self, records: &[serde_json::Value], label: &str) -> bool;
}

/// Severity of a check log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// Records the outcome of failed checks
pub trait CheckLogger: Send + Sync {
    fn log(&self, message: &str, level: LogLevel);
}

const CHECK_TARGET: &str = "margin_plausibility::checks";

/// Check logger that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCheckLogger;

impl CheckLogger for TracingCheckLogger {
    fn log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Debug => tracing::debug!(target: CHECK_TARGET, "{}", message),
            LogLevel::Info => tracing::info!(target: CHECK_TARGET, "{}", message),
            LogLevel::Warning => tracing::warn!(target: CHECK_TARGET, "{}", message),
            LogLevel::Error | LogLevel::Critical => {
                tracing::error!(target: CHECK_TARGET, severity = %level, "{}", message)
            }
        }
    }
}
