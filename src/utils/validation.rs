//! Parsing and validation utilities for raw snapshot rows

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::*;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Parse a snapshot date in strict `YYYY-MM-DD` form
pub fn parse_snapshot_date(value: &str) -> Option<NaiveDate> {
    if !matches_layout(value, b"dddd-dd-dd") {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Parse a snapshot time in strict zero-padded `HH:MM:SS` form
pub fn parse_snapshot_time(value: &str) -> Option<NaiveTime> {
    // chrono accepts single-digit hours, the snapshot feed never does
    if !matches_layout(value, b"dd:dd:dd") {
        return None;
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

/// Convert a stored margin into a decimal.
///
/// Goes through the shortest text form that round-trips the float, so
/// `3212.2` stays `3212.2` and distinct floats stay distinct decimals.
/// Non-finite values are rejected.
pub fn margin_to_decimal(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    value.to_string().parse::<BigDecimal>().ok()
}

fn matches_layout(value: &str, layout: &[u8]) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == layout.len()
        && bytes.iter().zip(layout).all(|(b, l)| match l {
            b'd' => b.is_ascii_digit(),
            sep => b == sep,
        })
}

/// Normalize a raw end-of-day row
pub fn normalize_end_of_day(index: usize, row: &EndOfDayRow) -> ReconciliationResult<MarginRecord> {
    let malformed = |field: &'static str, value: String| ReconciliationError::MalformedRecord {
        side: RecordSide::EndOfDay,
        index,
        field,
        value,
    };

    let date = parse_snapshot_date(&row.date)
        .ok_or_else(|| malformed("date", row.date.clone()))?;
    let margin = margin_to_decimal(row.margin)
        .ok_or_else(|| malformed("margin", row.margin.to_string()))?;

    Ok(MarginRecord::new(
        date,
        row.clearing_number.as_str(),
        row.account.as_str(),
        row.margin_type.as_str(),
        margin,
    ))
}

/// Normalize a raw intraday row
pub fn normalize_intraday(index: usize, row: &IntradayRow) -> ReconciliationResult<IntradayRecord> {
    let malformed = |field: &'static str, value: String| ReconciliationError::MalformedRecord {
        side: RecordSide::Intraday,
        index,
        field,
        value,
    };

    let date = parse_snapshot_date(&row.date)
        .ok_or_else(|| malformed("date", row.date.clone()))?;
    let time = parse_snapshot_time(&row.time)
        .ok_or_else(|| malformed("time", row.time.clone()))?;
    let margin = margin_to_decimal(row.margin)
        .ok_or_else(|| malformed("margin", row.margin.to_string()))?;

    Ok(IntradayRecord::new(
        date,
        time,
        row.clearing_number.as_str(),
        row.account.as_str(),
        row.margin_type.as_str(),
        margin,
    ))
}

/// A (date, clearing number, account, margin type) position reported more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePosition {
    pub date: NaiveDate,
    pub clearing_number: String,
    pub account: String,
    pub margin_type: MarginType,
    /// How many end-of-day records share this position
    pub occurrences: usize,
}

/// Find end-of-day positions that appear more than once for the same date.
///
/// Matching does not depend on positions being unique, but a duplicate usually
/// means the upstream snapshot is wrong.
pub fn find_duplicate_positions(records: &[MarginRecord]) -> Vec<DuplicatePosition> {
    let mut counts: BTreeMap<(NaiveDate, &str, &str, &MarginType), usize> = BTreeMap::new();
    for record in records {
        *counts
            .entry((
                record.date,
                record.clearing_number.as_str(),
                record.account.as_str(),
                &record.margin_type,
            ))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences > 1)
        .map(
            |((date, clearing_number, account, margin_type), occurrences)| DuplicatePosition {
                date,
                clearing_number: clearing_number.to_string(),
                account: account.to_string(),
                margin_type: margin_type.clone(),
                occurrences,
            },
        )
        .collect()
}
