//! Full outer join of end-of-day records against one intraday snapshot

use chrono::{Duration, NaiveDate, NaiveTime};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::MatchPolicy;
use crate::types::*;

/// Which intraday rows are eligible for a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutover {
    /// Snapshot time an intraday row must carry
    pub time: NaiveTime,
    /// Days added to an end-of-day date to get the intraday date it must match
    pub day_offset: i64,
}

impl Cutover {
    /// Intraday date an end-of-day record of `date` is compared against
    pub fn anchor_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        Duration::try_days(self.day_offset).and_then(|offset| date.checked_add_signed(offset))
    }
}

#[derive(Debug)]
pub(crate) struct JoinOutput<'a> {
    pub matched_count: usize,
    pub unmatched_eod: Vec<&'a MarginRecord>,
    pub unmatched_intraday: Vec<&'a IntradayRecord>,
}

#[derive(Default)]
struct Group<'a> {
    eod: Vec<&'a MarginRecord>,
    intraday: Vec<&'a IntradayRecord>,
}

/// Join both sides on (anchor date, business key).
///
/// Only intraday rows at the cutover time whose date is the anchor date of at
/// least one end-of-day record take part. Output follows key order and, within
/// a key, input order.
pub(crate) fn outer_join<'a>(
    end_of_day: &'a [MarginRecord],
    intraday: &'a [IntradayRecord],
    cutover: Cutover,
    policy: MatchPolicy,
) -> JoinOutput<'a> {
    let mut groups: BTreeMap<(NaiveDate, BusinessKey), Group<'a>> = BTreeMap::new();
    let mut window: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut out_of_calendar = Vec::new();

    for record in end_of_day {
        match cutover.anchor_date(record.date) {
            Some(anchor) => {
                window.insert(anchor);
                groups
                    .entry((anchor, record.business_key()))
                    .or_default()
                    .eod
                    .push(record);
            }
            None => out_of_calendar.push(record),
        }
    }

    for record in intraday
        .iter()
        .filter(|r| r.time == cutover.time && window.contains(&r.date))
    {
        groups
            .entry((record.date, record.business_key()))
            .or_default()
            .intraday
            .push(record);
    }

    let mut output = JoinOutput {
        matched_count: 0,
        unmatched_eod: Vec::new(),
        unmatched_intraday: Vec::new(),
    };

    for group in groups.into_values() {
        let paired = match policy {
            MatchPolicy::AnyMatch if !group.eod.is_empty() && !group.intraday.is_empty() => {
                output.matched_count += group.eod.len();
                continue;
            }
            MatchPolicy::AnyMatch => 0,
            MatchPolicy::OneToOne => group.eod.len().min(group.intraday.len()),
        };
        output.matched_count += paired;
        output.unmatched_eod.extend_from_slice(&group.eod[paired..]);
        output
            .unmatched_intraday
            .extend_from_slice(&group.intraday[paired..]);
    }

    output.unmatched_eod.extend(out_of_calendar);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 5, d).unwrap()
    }

    fn at(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn eod(account: &str, margin: i64) -> MarginRecord {
        MarginRecord::new(
            date(11),
            "Bank 1",
            account,
            "SPAN",
            BigDecimal::from(margin),
        )
    }

    fn intra(day: u32, hour: u32, account: &str, margin: i64) -> IntradayRecord {
        IntradayRecord::new(
            date(day),
            at(hour),
            "Bank 1",
            account,
            "SPAN",
            BigDecimal::from(margin),
        )
    }

    fn first() -> Cutover {
        Cutover {
            time: at(8),
            day_offset: 1,
        }
    }

    #[test]
    fn test_anchor_date_offsets() {
        assert_eq!(first().anchor_date(date(11)), Some(date(12)));
        let same_day = Cutover {
            time: at(19),
            day_offset: 0,
        };
        assert_eq!(same_day.anchor_date(date(11)), Some(date(11)));
        assert_eq!(first().anchor_date(NaiveDate::MAX), None);
    }

    #[test]
    fn test_join_reports_both_sides() {
        let end_of_day = vec![eod("A1", 10), eod("A2", 20)];
        let intraday = vec![
            intra(12, 8, "A1", 10),
            intra(12, 8, "A2", 21),
            // wrong time and wrong day never take part
            intra(12, 9, "A2", 20),
            intra(11, 8, "A2", 20),
        ];

        let out = outer_join(&end_of_day, &intraday, first(), MatchPolicy::AnyMatch);
        assert_eq!(out.matched_count, 1);
        assert_eq!(out.unmatched_eod, vec![&end_of_day[1]]);
        assert_eq!(out.unmatched_intraday, vec![&intraday[1]]);
    }

    #[test]
    fn test_duplicate_policies() {
        let end_of_day = vec![eod("A1", 10), eod("A1", 10)];
        let intraday = vec![intra(12, 8, "A1", 10)];

        let any = outer_join(&end_of_day, &intraday, first(), MatchPolicy::AnyMatch);
        assert_eq!(any.matched_count, 2);
        assert!(any.unmatched_eod.is_empty());
        assert!(any.unmatched_intraday.is_empty());

        let strict = outer_join(&end_of_day, &intraday, first(), MatchPolicy::OneToOne);
        assert_eq!(strict.matched_count, 1);
        assert_eq!(strict.unmatched_eod, vec![&end_of_day[1]]);
        assert!(strict.unmatched_intraday.is_empty());
    }

    #[test]
    fn test_surplus_intraday_under_one_to_one() {
        let end_of_day = vec![eod("A1", 10)];
        let intraday = vec![intra(12, 8, "A1", 10), intra(12, 8, "A1", 10)];

        let any = outer_join(&end_of_day, &intraday, first(), MatchPolicy::AnyMatch);
        assert!(any.unmatched_intraday.is_empty());

        let strict = outer_join(&end_of_day, &intraday, first(), MatchPolicy::OneToOne);
        assert_eq!(strict.unmatched_intraday, vec![&intraday[1]]);
    }
}
