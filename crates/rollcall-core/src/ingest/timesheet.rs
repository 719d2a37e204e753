//! Timesheet sheet: check-in/check-out events turned into sessions.
//!
//! # Passes
//!
//! 1. **Identity pre-pass.** Every distinct `(state id, name)` pair is
//!    normalized and resolved, records are created as needed, and a lookup
//!    from the name as written to its canonical name is built. This runs to
//!    completion before any event is applied, so the event loop never creates
//!    records.
//! 2. **Event loop.** Rows are applied in sheet order (not grouped by
//!    person). Each person is either logged in or not:
//!
//!    | action    | logged in | result                         |
//!    |-----------|-----------|--------------------------------|
//!    | Check In  | no        | session opened                 |
//!    | Check Out | yes       | session closed, hours added    |
//!    | Check In  | yes       | `crash` anomaly                |
//!    | Check Out | no        | `pre` anomaly                  |
//!    | other     | either    | `other` anomaly                |
//!
//!    A row with no timestamp is an `other` anomaly.
//! 3. **Post-pass.** Anyone still logged in gets one `post` anomaly holding
//!    their last row.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cell_at;
use crate::config::TimesheetConfig;
use crate::error::IngestError;
use crate::model::{Action, AnomalyKind, PersonRecord, RawEvent, Registry, Session, UNKNOWN_ID};
use crate::resolve::NameResolver;
use crate::table::Table;

/// Earliest and latest timestamp seen in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Period {
    fn widen(this: Option<Self>, t: NaiveDateTime) -> Self {
        match this {
            Some(p) => Self {
                start: p.start.min(t),
                end: p.end.max(t),
            },
            None => Self { start: t, end: t },
        }
    }
}

/// Anomalies raised by one pass, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    pub crash: usize,
    pub pre_period: usize,
    pub post_period: usize,
    pub other: usize,
}

impl AnomalyCounts {
    fn bump(&mut self, kind: AnomalyKind) {
        match kind {
            AnomalyKind::Crash => self.crash += 1,
            AnomalyKind::PrePeriod => self.pre_period += 1,
            AnomalyKind::PostPeriod => self.post_period += 1,
            AnomalyKind::Other => self.other += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.crash + self.pre_period + self.post_period + self.other
    }
}

/// What one timesheet pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetReport {
    pub rows_read: usize,
    /// Rows without a usable name.
    pub rows_skipped: usize,
    /// Distinct canonical identities seen in the sheet.
    pub identities: usize,
    pub records_created: usize,
    pub sessions: usize,
    pub anomalies: AnomalyCounts,
    pub period: Option<Period>,
}

/// Result of applying one event to one person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Opened,
    Closed(Session),
    Anomaly(AnomalyKind),
}

/// Apply one timesheet event to `person`.
///
/// Anomalies are recorded on the person with a copy of the raw row; state
/// changes only on a clean open or close.
pub fn reconcile(person: &mut PersonRecord, event: &RawEvent) -> Outcome {
    person.note_event(event);

    let outcome = match (event.time, event.kind(), person.is_logged_in()) {
        (Some(t), Action::CheckIn, false) => {
            person.open_session(t);
            return Outcome::Opened;
        }
        (Some(t), Action::CheckOut, true) => {
            if let Some(session) = person.close_session(t) {
                if session.end < session.start {
                    warn!(name = %person.name, row = event.row, "check-out precedes check-in");
                }
                return Outcome::Closed(session);
            }
            AnomalyKind::Other
        }
        (Some(_), Action::CheckIn, true) => AnomalyKind::Crash,
        (Some(_), Action::CheckOut, false) => AnomalyKind::PrePeriod,
        (None, _, _) | (_, Action::Other, _) => AnomalyKind::Other,
    };

    person.anomalies.push(outcome, event.clone());
    Outcome::Anomaly(outcome)
}

/// Read the timesheet rows, resolve identities, and pair events into sessions.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when the time, name, or action
/// column is absent. The ID column is optional.
pub fn ingest_timesheet(
    table: &Table,
    config: &TimesheetConfig,
    registry: &mut Registry,
    resolver: &mut NameResolver,
) -> Result<TimesheetReport, IngestError> {
    let time_col = table.require_column(&config.time_column)?;
    let name_col = table.require_column(&config.name_column)?;
    let action_col = table.require_column(&config.action_column)?;
    let id_col = table.column(&config.id_column);

    let mut report = TimesheetReport::default();

    let mut events = Vec::with_capacity(table.len());
    for (row, cells) in table.rows() {
        report.rows_read += 1;
        let time = cells[time_col].as_timestamp();
        if let Some(t) = time {
            report.period = Some(Period::widen(report.period, t));
        }
        let Some(name) = cells[name_col].as_text() else {
            debug!(row, "timesheet row has no usable name; skipping");
            report.rows_skipped += 1;
            continue;
        };
        events.push(RawEvent {
            row,
            time,
            name: name.to_string(),
            action: cells[action_col].display().trim().to_string(),
            state_id: cell_at(cells, id_col).as_i64(),
        });
    }

    let lookup = resolve_identities(&events, registry, resolver, &mut report);

    let mut touched: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for event in &events {
        let Some(canonical) = lookup.get(event.name.as_str()) else {
            report.rows_skipped += 1;
            continue;
        };
        let Some(person) = registry.get_mut(canonical) else {
            continue;
        };
        if seen.insert(canonical.as_str()) {
            touched.push(canonical.as_str());
        }
        match reconcile(person, event) {
            Outcome::Opened => {}
            Outcome::Closed(_) => report.sessions += 1,
            Outcome::Anomaly(kind) => report.anomalies.bump(kind),
        }
    }

    for name in touched {
        let Some(person) = registry.get_mut(name) else {
            continue;
        };
        if !person.is_logged_in() {
            continue;
        }
        if let Some(last) = person.last_event().cloned() {
            warn!(name, row = last.row, "still checked in at end of period");
            person.anomalies.push(AnomalyKind::PostPeriod, last);
            report.anomalies.bump(AnomalyKind::PostPeriod);
        }
    }

    report.identities = seen.len();
    info!(
        source = %table.source_name,
        rows = report.rows_read,
        identities = report.identities,
        sessions = report.sessions,
        anomalies = report.anomalies.total(),
        "timesheet ingested"
    );
    Ok(report)
}

/// Identity pre-pass: map each name as written to its canonical name.
fn resolve_identities(
    events: &[RawEvent],
    registry: &mut Registry,
    resolver: &mut NameResolver,
    report: &mut TimesheetReport,
) -> HashMap<String, String> {
    let mut pairs_seen: HashSet<(Option<i64>, &str)> = HashSet::new();
    let mut lookup: HashMap<String, String> = HashMap::new();

    for event in events {
        if !pairs_seen.insert((event.state_id, event.name.as_str())) {
            continue;
        }
        if lookup.contains_key(&event.name) {
            continue;
        }
        let Some(resolution) = registry.resolve(resolver, &event.name) else {
            debug!(row = event.row, raw = %event.name, "name has no word characters; skipping");
            continue;
        };
        let canonical = resolution.into_canonical();
        let (_, created) =
            registry.get_or_create(&canonical, event.state_id.unwrap_or(UNKNOWN_ID));
        if created {
            report.records_created += 1;
        }
        lookup.insert(event.name.clone(), canonical);
    }

    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
    }

    fn sheet(rows: &[(&str, &str, &str, &str)]) -> Table {
        let mut t = Table::new("timesheet", ["Time", "Name", "Action", "State ID"]);
        for (time, name, action, id) in rows {
            t.push_row(vec![
                Cell::from(*time),
                Cell::from(*name),
                Cell::from(*action),
                Cell::from(*id),
            ]);
        }
        t
    }

    fn run(table: &Table) -> (Registry, TimesheetReport) {
        let mut reg = Registry::new();
        let report = run_into(table, &mut reg);
        (reg, report)
    }

    fn run_into(table: &Table, reg: &mut Registry) -> TimesheetReport {
        let mut resolver = NameResolver::default();
        ingest_timesheet(table, &TimesheetConfig::default(), reg, &mut resolver)
            .expect("timesheet ingests")
    }

    #[test]
    fn check_in_then_out_forms_a_session() {
        let (reg, report) = run(&sheet(&[
            ("2024-03-04 09:00:00", "Ann Lee", "Check In", "41"),
            ("2024-03-04 17:30:00", "Ann Lee", "Check Out", "41"),
        ]));
        let ann = reg.get("Ann Lee").expect("present");
        assert_eq!(ann.id, 41);
        assert_eq!(
            ann.sessions,
            vec![Session {
                start: ts("2024-03-04 09:00:00"),
                end: ts("2024-03-04 17:30:00"),
            }]
        );
        assert!((ann.logged_hours - 8.5).abs() < 1e-9);
        assert!(ann.anomalies.is_empty());
        assert_eq!(report.sessions, 1);
        assert_eq!(
            report.period,
            Some(Period {
                start: ts("2024-03-04 09:00:00"),
                end: ts("2024-03-04 17:30:00"),
            })
        );
    }

    #[test]
    fn double_check_in_is_one_crash() {
        let (reg, report) = run(&sheet(&[
            ("2024-03-04 09:00:00", "Ann Lee", "Check In", "41"),
            ("2024-03-04 10:00:00", "Ann Lee", "Check In", "41"),
            ("2024-03-04 12:00:00", "Ann Lee", "Check Out", "41"),
        ]));
        let ann = reg.get("Ann Lee").expect("present");
        assert_eq!(ann.anomalies.crash.len(), 1);
        assert_eq!(ann.anomalies.crash[0].row, 2);
        assert_eq!(ann.sessions.len(), 1);
        // The session keeps the first check-in.
        assert_eq!(ann.sessions[0].start, ts("2024-03-04 09:00:00"));
        assert_eq!(report.anomalies.crash, 1);
    }

    #[test]
    fn leading_check_out_is_pre_period() {
        let (reg, _) = run(&sheet(&[
            ("2024-03-04 02:00:00", "Ann Lee", "Check Out", "41"),
            ("2024-03-04 09:00:00", "Ann Lee", "Check In", "41"),
            ("2024-03-04 11:00:00", "Ann Lee", "Check Out", "41"),
        ]));
        let ann = reg.get("Ann Lee").expect("present");
        assert_eq!(ann.anomalies.pre_period.len(), 1);
        assert_eq!(ann.anomalies.pre_period[0].row, 1);
        assert_eq!(ann.sessions.len(), 1);
    }

    #[test]
    fn open_session_at_end_is_one_post_period() {
        let (reg, report) = run(&sheet(&[
            ("2024-03-04 09:00:00", "Ann Lee", "Check In", "41"),
            ("2024-03-04 10:00:00", "Bo Chen", "Check In", "42"),
            ("2024-03-04 11:00:00", "Ann Lee", "Check Out", "41"),
            ("2024-03-04 12:00:00", "Ann Lee.", "Check In", "41"),
        ]));
        let ann = reg.get("Ann Lee").expect("present");
        assert_eq!(ann.anomalies.post_period.len(), 1);
        assert_eq!(ann.anomalies.post_period[0].row, 4);
        assert!(ann.is_logged_in());
        let bo = reg.get("Bo Chen").expect("present");
        assert_eq!(bo.anomalies.post_period.len(), 1);
        assert_eq!(bo.anomalies.post_period[0].row, 2);
        assert_eq!(report.anomalies.post_period, 2);
    }

    #[test]
    fn unknown_actions_and_missing_times_are_other() {
        let (reg, report) = run(&sheet(&[
            ("2024-03-04 09:00:00", "Ann Lee", "Break", "41"),
            ("", "Ann Lee", "Check In", "41"),
        ]));
        let ann = reg.get("Ann Lee").expect("present");
        assert_eq!(ann.anomalies.other.len(), 2);
        assert!(!ann.is_logged_in());
        assert_eq!(report.anomalies.other, 2);
    }

    #[test]
    fn rows_are_applied_in_sheet_order_across_people() {
        let (reg, _) = run(&sheet(&[
            ("2024-03-04 09:00:00", "Ann Lee", "Check In", "41"),
            ("2024-03-04 09:05:00", "Bo Chen", "Check In", "42"),
            ("2024-03-04 13:00:00", "Bo Chen", "Check Out", "42"),
            ("2024-03-04 17:00:00", "Ann Lee", "Check Out", "41"),
        ]));
        assert!((reg.get("Ann Lee").expect("present").logged_hours - 8.0).abs() < 1e-9);
        let bo = reg.get("Bo Chen").expect("present");
        assert!((bo.logged_hours - (3.0 + 55.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn spelling_variants_share_one_record() {
        let (reg, report) = run(&sheet(&[
            ("2024-03-04 09:00:00", "Katherine Mills", "Check In", "5"),
            ("2024-03-04 12:00:00", "Katherine Mils", "Check Out", "5"),
        ]));
        assert_eq!(reg.len(), 1);
        assert_eq!(report.identities, 1);
        assert_eq!(reg.get("Katherine Mills").expect("present").sessions.len(), 1);
    }

    #[test]
    fn existing_roster_id_is_kept() {
        let mut reg = Registry::new();
        reg.get_or_create("Ann Lee", 41);
        let report = run_into(
            &sheet(&[("2024-03-04 09:00:00", "Ann Lee", "Check In", "")]),
            &mut reg,
        );
        assert_eq!(report.records_created, 0);
        assert_eq!(reg.get("Ann Lee").expect("present").id, 41);
    }

    #[test]
    fn blank_id_gets_sentinel() {
        let (reg, _) = run(&sheet(&[("2024-03-04 09:00:00", "Ann Lee", "Check In", "")]));
        assert_eq!(reg.get("Ann Lee").expect("present").id, UNKNOWN_ID);
    }

    #[test]
    fn nameless_rows_are_skipped() {
        let (reg, report) = run(&sheet(&[
            ("2024-03-04 09:00:00", "", "Check In", "41"),
            ("2024-03-04 10:00:00", "***", "Check In", "41"),
        ]));
        assert!(reg.is_empty());
        assert_eq!(report.rows_skipped, 2);
    }

    #[test]
    fn missing_action_column_is_an_error() {
        let t = Table::new("timesheet", ["Time", "Name"]);
        let mut reg = Registry::new();
        let mut resolver = NameResolver::default();
        let err = ingest_timesheet(&t, &TimesheetConfig::default(), &mut reg, &mut resolver)
            .expect_err("no Action column");
        assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "Action"));
    }
}
