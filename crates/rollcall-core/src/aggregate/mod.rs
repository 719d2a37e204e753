//! Shift and week bucketing of sessions and incidents.
//!
//! [`analyze`] is pure: it reads a person's sessions and incidents and
//! returns fresh [`WorkStats`]. [`analyze_registry`] stores the result on
//! every record.
//!
//! - Session time is split by interval intersection against the shift
//!   sub-windows of the login day ([`shift`]) and against Monday-aligned week
//!   bins ([`week`]).
//! - Incidents are instants and count once in the single sub-window and week
//!   bin that contains them.

pub mod shift;
pub mod summary;
pub mod week;

use std::ops::AddAssign;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{PersonRecord, Registry};
use shift::{FOLD, fold_hours, instant_sub_window, session_overlap_hours};
use summary::{Spread, interior_spread};
use week::WeekBins;

/// The three named labor periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    /// 09:00–17:00.
    First,
    /// 17:00–01:00.
    Second,
    /// 01:00–09:00.
    Third,
}

impl Shift {
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "09:00-17:00",
            Self::Second => "17:00-01:00",
            Self::Third => "01:00-09:00",
        }
    }
}

/// One value per shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftTotals<T> {
    pub shift1: T,
    pub shift2: T,
    pub shift3: T,
}

impl<T: Copy + AddAssign> ShiftTotals<T> {
    #[must_use]
    pub fn get(&self, shift: Shift) -> T {
        match shift {
            Shift::First => self.shift1,
            Shift::Second => self.shift2,
            Shift::Third => self.shift3,
        }
    }

    pub fn get_mut(&mut self, shift: Shift) -> &mut T {
        match shift {
            Shift::First => &mut self.shift1,
            Shift::Second => &mut self.shift2,
            Shift::Third => &mut self.shift3,
        }
    }

    /// Add `other` shift by shift.
    pub fn accumulate(&mut self, other: &Self) {
        for shift in Shift::ALL {
            *self.get_mut(shift) += other.get(shift);
        }
    }
}

impl ShiftTotals<f64> {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.shift1 + self.shift2 + self.shift3
    }
}

/// Aggregates for one person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkStats {
    pub shift_hours: ShiftTotals<f64>,
    pub shift_incidents: ShiftTotals<u32>,
    /// Monday of each week bin.
    pub week_starts: Vec<NaiveDate>,
    pub hours_per_week: Vec<f64>,
    pub incidents_per_week: Vec<u32>,
}

impl WorkStats {
    /// Interior-week spread of hours worked.
    #[must_use]
    pub fn weekly_hours(&self) -> Option<Spread> {
        interior_spread(&self.hours_per_week)
    }

    /// Interior-week spread of incident counts.
    #[must_use]
    pub fn weekly_incidents(&self) -> Option<Spread> {
        let counts: Vec<f64> = self.incidents_per_week.iter().map(|&c| f64::from(c)).collect();
        interior_spread(&counts)
    }
}

/// First and last instants that set the week range for `person`.
///
/// Sessions decide the range; a person with only incidents falls back to
/// the incident times.
fn week_span(person: &PersonRecord) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let from_sessions = person
        .sessions
        .iter()
        .map(|s| (s.start, s.end))
        .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)));
    from_sessions.or_else(|| {
        person
            .incidents
            .iter()
            .map(|i| (i.time, i.time))
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    })
}

/// Compute shift and week aggregates for one person.
#[must_use]
pub fn analyze(person: &PersonRecord) -> WorkStats {
    let mut stats = WorkStats::default();

    if person.sessions.is_empty() {
        debug!(name = %person.name, "no timesheet sessions collected");
    }

    let bins = week_span(person).map(|(first, last)| WeekBins::spanning(first, last));
    let mut week_seconds = vec![0_i64; bins.as_ref().map_or(0, WeekBins::len)];
    stats.incidents_per_week = vec![0; week_seconds.len()];
    stats.week_starts = bins.as_ref().map(WeekBins::starts).unwrap_or_default();

    for session in &person.sessions {
        let parts = session_overlap_hours(session);
        stats.shift_hours.accumulate(&fold_hours(&parts));

        if let Some(bins) = &bins {
            for (acc, secs) in week_seconds.iter_mut().zip(bins.session_seconds(session)) {
                *acc += secs;
            }
        }
    }
    stats.hours_per_week = week_seconds.iter().map(|&s| s as f64 / 3600.0).collect();

    for incident in &person.incidents {
        if let Some(i) = bins.as_ref().and_then(|b| b.bin_of(incident.time)) {
            stats.incidents_per_week[i] += 1;
        }
        if let Some(j) = instant_sub_window(incident.time) {
            *stats.shift_incidents.get_mut(FOLD[j]) += 1;
        }
    }

    stats
}

/// Run [`analyze`] for every record and store the result.
pub fn analyze_registry(registry: &mut Registry) {
    for person in registry.iter_mut() {
        person.stats = analyze(person);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IncidentEntry, Session};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
    }

    fn person_with(sessions: &[(&str, &str)], incidents: &[&str]) -> PersonRecord {
        let mut p = PersonRecord::new("Ann Lee", 7);
        p.sessions = sessions
            .iter()
            .map(|(a, b)| Session {
                start: ts(a),
                end: ts(b),
            })
            .collect();
        p.incidents = incidents
            .iter()
            .enumerate()
            .map(|(i, t)| IncidentEntry {
                id: format!("{}", 100 + i),
                time: ts(t),
            })
            .collect();
        p
    }

    #[test]
    fn empty_person_has_empty_stats() {
        let stats = analyze(&PersonRecord::new("Nobody", 0));
        assert_eq!(stats, WorkStats::default());
        assert!(stats.weekly_hours().is_none());
    }

    #[test]
    fn incident_at_ten_counts_in_shift_one_only() {
        let p = person_with(&[], &["2024-03-04 10:00:00"]);
        let stats = analyze(&p);
        assert_eq!(stats.shift_incidents.shift1, 1);
        assert_eq!(stats.shift_incidents.shift2, 0);
        assert_eq!(stats.shift_incidents.shift3, 0);
        assert_eq!(stats.incidents_per_week, vec![1]);
    }

    #[test]
    fn weekly_hours_follow_sessions() {
        let p = person_with(
            &[
                ("2024-03-04 09:00:00", "2024-03-04 17:00:00"),
                ("2024-03-12 09:00:00", "2024-03-12 13:00:00"),
                ("2024-03-19 09:00:00", "2024-03-19 10:00:00"),
            ],
            &["2024-03-12 11:00:00", "2024-03-01 11:00:00"],
        );
        let stats = analyze(&p);
        assert_eq!(stats.hours_per_week.len(), 3);
        assert!((stats.hours_per_week[0] - 8.0).abs() < 1e-9);
        assert!((stats.hours_per_week[1] - 4.0).abs() < 1e-9);
        assert!((stats.hours_per_week[2] - 1.0).abs() < 1e-9);
        // The March 1 incident predates the first session's week.
        assert_eq!(stats.incidents_per_week, vec![0, 1, 0]);
        assert_eq!(stats.shift_incidents.shift1, 2);
        assert!((stats.shift_hours.shift1 - 13.0).abs() < 1e-9);

        let weekly = stats.weekly_hours().expect("three weeks");
        assert!((weekly.mean - 4.0).abs() < 1e-9);
        assert!(weekly.stdev.abs() < 1e-9);
    }

    #[test]
    fn analyze_registry_fills_every_record() {
        let mut reg = Registry::new();
        reg.get_or_create("Ann Lee", 7).0.sessions = vec![Session {
            start: ts("2024-03-04 09:00:00"),
            end: ts("2024-03-04 12:00:00"),
        }];
        reg.get_or_create("Bo Chen", 8);
        analyze_registry(&mut reg);
        let ann = reg.get("Ann Lee").expect("present");
        assert!((ann.stats.shift_hours.shift1 - 3.0).abs() < 1e-9);
        assert_eq!(ann.stats.hours_per_week.len(), 1);
        assert!(reg.get("Bo Chen").expect("present").stats.hours_per_week.is_empty());
    }
}
