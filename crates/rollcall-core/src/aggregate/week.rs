//! Monday-aligned week bins.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::Session;

/// Seconds in one week bin.
pub const WEEK_SECONDS: i64 = 604_800;

/// Consecutive Monday 00:00 boundaries; bin `i` is `[bounds[i], bounds[i + 1])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekBins {
    bounds: Vec<NaiveDateTime>,
}

/// Monday 00:00 on or before `t`.
#[must_use]
pub fn monday_on_or_before(t: NaiveDateTime) -> NaiveDateTime {
    let date = t.date();
    let back = i64::from(date.weekday().num_days_from_monday());
    (date - Duration::days(back)).and_time(NaiveTime::MIN)
}

impl WeekBins {
    /// Bins from the Monday on or before `first` to the Monday after `last`.
    #[must_use]
    pub fn spanning(first: NaiveDateTime, last: NaiveDateTime) -> Self {
        let start = monday_on_or_before(first);
        let end = monday_on_or_before(last.max(first)) + Duration::days(7);
        let weeks = (end - start).num_seconds() / WEEK_SECONDS;
        let bounds = (0..=weeks)
            .map(|i| start + Duration::seconds(i * WEEK_SECONDS))
            .collect();
        Self { bounds }
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start date (a Monday) of each bin.
    #[must_use]
    pub fn starts(&self) -> Vec<NaiveDate> {
        self.bins().map(|(lb, _)| lb.date()).collect()
    }

    fn bins(&self) -> impl Iterator<Item = (NaiveDateTime, NaiveDateTime)> + '_ {
        self.bounds.windows(2).map(|w| (w[0], w[1]))
    }

    /// Seconds of `session` inside each bin (clamped intersection).
    #[must_use]
    pub fn session_seconds(&self, session: &Session) -> Vec<i64> {
        self.bins()
            .map(|(lb, ub)| (session.end.min(ub) - session.start.max(lb)).num_seconds().max(0))
            .collect()
    }

    /// Bin with `start <= t < end`, if any.
    #[must_use]
    pub fn bin_of(&self, t: NaiveDateTime) -> Option<usize> {
        self.bins().position(|(lb, ub)| lb <= t && t < ub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
    }

    #[test]
    fn monday_alignment() {
        // 2024-03-04 is a Monday.
        assert_eq!(monday_on_or_before(ts("2024-03-04 00:00:00")), ts("2024-03-04 00:00:00"));
        assert_eq!(monday_on_or_before(ts("2024-03-10 23:00:00")), ts("2024-03-04 00:00:00"));
        assert_eq!(monday_on_or_before(ts("2024-03-06 12:00:00")), ts("2024-03-04 00:00:00"));
    }

    #[test]
    fn span_reaches_the_monday_after_the_last_instant() {
        let bins = WeekBins::spanning(ts("2024-03-06 09:00:00"), ts("2024-03-20 17:00:00"));
        assert_eq!(bins.len(), 3);
        assert_eq!(
            bins.starts(),
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 4).expect("date"),
                NaiveDate::from_ymd_opt(2024, 3, 11).expect("date"),
                NaiveDate::from_ymd_opt(2024, 3, 18).expect("date"),
            ]
        );
    }

    #[test]
    fn session_crossing_monday_splits_between_weeks() {
        let bins = WeekBins::spanning(ts("2024-03-10 23:00:00"), ts("2024-03-11 01:30:00"));
        assert_eq!(bins.len(), 2);
        let s = Session {
            start: ts("2024-03-10 23:00:00"),
            end: ts("2024-03-11 01:30:00"),
        };
        assert_eq!(bins.session_seconds(&s), vec![3600, 5400]);
    }

    #[test]
    fn instants_use_half_open_bins() {
        let bins = WeekBins::spanning(ts("2024-03-04 00:00:00"), ts("2024-03-12 00:00:00"));
        assert_eq!(bins.bin_of(ts("2024-03-04 00:00:00")), Some(0));
        assert_eq!(bins.bin_of(ts("2024-03-11 00:00:00")), Some(1));
        assert_eq!(bins.bin_of(ts("2024-03-01 00:00:00")), None);
        assert_eq!(bins.bin_of(ts("2024-03-18 00:00:00")), None);
    }
}
