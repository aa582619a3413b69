//! Core types and data structures for margin reconciliation

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Margin methodologies reported by the clearing house
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MarginType {
    /// Standard Portfolio Analysis of Risk
    Span,
    /// Initial Margin Short-term Model
    Imsm,
    /// Any other methodology, carried verbatim
    Other(String),
}

impl MarginType {
    pub fn as_str(&self) -> &str {
        match self {
            MarginType::Span => "SPAN",
            MarginType::Imsm => "IMSM",
            MarginType::Other(name) => name,
        }
    }
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarginType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SPAN" => MarginType::Span,
            "IMSM" => MarginType::Imsm,
            other => MarginType::Other(other.to_string()),
        })
    }
}

impl From<String> for MarginType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SPAN" => MarginType::Span,
            "IMSM" => MarginType::Imsm,
            _ => MarginType::Other(value),
        }
    }
}

impl From<&str> for MarginType {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl From<MarginType> for String {
    fn from(value: MarginType) -> Self {
        match value {
            MarginType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// The non-temporal identity of a margin observation.
///
/// Two records agree when their keys are equal; the margin is part of the key
/// and is compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessKey {
    pub clearing_number: String,
    pub account: String,
    pub margin_type: MarginType,
    pub margin: BigDecimal,
}

/// Normalized end-of-day margin entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginRecord {
    /// Business date of the snapshot
    pub date: NaiveDate,
    /// Clearing member the account belongs to
    pub clearing_number: String,
    /// Account identifier within the clearing member
    pub account: String,
    /// Margin methodology
    pub margin_type: MarginType,
    /// Margin requirement
    pub margin: BigDecimal,
}

impl MarginRecord {
    /// Create a new end-of-day record
    pub fn new(
        date: NaiveDate,
        clearing_number: impl Into<String>,
        account: impl Into<String>,
        margin_type: impl Into<MarginType>,
        margin: BigDecimal,
    ) -> Self {
        Self {
            date,
            clearing_number: clearing_number.into(),
            account: account.into(),
            margin_type: margin_type.into(),
            margin,
        }
    }

    /// Key used to match this record against intraday observations
    pub fn business_key(&self) -> BusinessKey {
        BusinessKey {
            clearing_number: self.clearing_number.clone(),
            account: self.account.clone(),
            margin_type: self.margin_type.clone(),
            margin: self.margin.clone(),
        }
    }
}

/// Normalized intraday margin observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntradayRecord {
    /// Business date of the observation
    pub date: NaiveDate,
    /// Snapshot time of day
    pub time: NaiveTime,
    pub clearing_number: String,
    pub account: String,
    pub margin_type: MarginType,
    pub margin: BigDecimal,
}

impl IntradayRecord {
    /// Create a new intraday record
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        clearing_number: impl Into<String>,
        account: impl Into<String>,
        margin_type: impl Into<MarginType>,
        margin: BigDecimal,
    ) -> Self {
        Self {
            date,
            time,
            clearing_number: clearing_number.into(),
            account: account.into(),
            margin_type: margin_type.into(),
            margin,
        }
    }

    pub fn business_key(&self) -> BusinessKey {
        BusinessKey {
            clearing_number: self.clearing_number.clone(),
            account: self.account.clone(),
            margin_type: self.margin_type.clone(),
            margin: self.margin.clone(),
        }
    }
}

/// End-of-day row as delivered by a data source, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndOfDayRow {
    pub date: String,
    pub clearing_number: String,
    pub account: String,
    pub margin_type: String,
    pub margin: f64,
}

impl EndOfDayRow {
    pub fn new(
        date: &str,
        clearing_number: &str,
        account: &str,
        margin_type: &str,
        margin: f64,
    ) -> Self {
        Self {
            date: date.to_string(),
            clearing_number: clearing_number.to_string(),
            account: account.to_string(),
            margin_type: margin_type.to_string(),
            margin,
        }
    }
}

/// Intraday row as delivered by a data source, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayRow {
    pub date: String,
    pub time: String,
    pub clearing_number: String,
    pub account: String,
    pub margin_type: String,
    pub margin: f64,
}

impl IntradayRow {
    pub fn new(
        date: &str,
        time: &str,
        clearing_number: &str,
        account: &str,
        margin_type: &str,
        margin: f64,
    ) -> Self {
        Self {
            date: date.to_string(),
            time: time.to_string(),
            clearing_number: clearing_number.to_string(),
            account: account.to_string(),
            margin_type: margin_type.to_string(),
            margin,
        }
    }
}

/// Which input collection a record or error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSide {
    EndOfDay,
    Intraday,
}

impl fmt::Display for RecordSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSide::EndOfDay => f.write_str("end-of-day"),
            RecordSide::Intraday => f.write_str("intraday"),
        }
    }
}

/// Errors that make a record set unusable for reconciliation
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("{side} records must not be empty")]
    EmptyInput { side: RecordSide },
    #[error("Malformed {side} record at index {index}: cannot parse {field} from '{value}'")]
    MalformedRecord {
        side: RecordSide,
        index: usize,
        field: &'static str,
        value: String,
    },
    #[error("Data source error: {0}")]
    Source(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for reconciliation operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_type_parsing() {
        assert_eq!("SPAN".parse::<MarginType>().unwrap(), MarginType::Span);
        assert_eq!(MarginType::from("IMSM"), MarginType::Imsm);
        assert_eq!(
            MarginType::from("PRISMA"),
            MarginType::Other("PRISMA".to_string())
        );
        assert_eq!(String::from(MarginType::Span), "SPAN");
    }

    #[test]
    fn test_margin_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&MarginType::Imsm).unwrap();
        assert_eq!(json, "\"IMSM\"");
        let back: MarginType = serde_json::from_str("\"CUSTOM\"").unwrap();
        assert_eq!(back, MarginType::Other("CUSTOM".to_string()));
    }

    #[test]
    fn test_business_key_ignores_date() {
        let margin = BigDecimal::from(100);
        let a = MarginRecord::new(
            NaiveDate::from_ymd_opt(2020, 5, 11).unwrap(),
            "Bank 1",
            "A1",
            "SPAN",
            margin.clone(),
        );
        let b = IntradayRecord::new(
            NaiveDate::from_ymd_opt(2020, 5, 12).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            "Bank 1",
            "A1",
            "SPAN",
            margin,
        );
        assert_eq!(a.business_key(), b.business_key());
    }

    #[test]
    fn test_error_messages() {
        let err = ReconciliationError::EmptyInput {
            side: RecordSide::Intraday,
        };
        assert_eq!(err.to_string(), "intraday records must not be empty");

        let err = ReconciliationError::MalformedRecord {
            side: RecordSide::Intraday,
            index: 3,
            field: "time",
            value: "8:00".to_string(),
        };
        assert!(err.to_string().contains("index 3"));
        assert!(err.to_string().contains("'8:00'"));
    }
}
