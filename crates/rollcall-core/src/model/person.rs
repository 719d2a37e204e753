use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::WorkStats;

/// ID given to roster and timesheet rows whose ID cell is blank.
pub const UNKNOWN_ID: i64 = -9999;

/// ID given to people first seen in the incident log, which carries no IDs.
pub const INCIDENT_ONLY_ID: i64 = 0;

/// What a timesheet row says happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CheckIn,
    CheckOut,
    Other,
}

impl Action {
    /// Parse the action column. Case and whitespace are ignored, so
    /// `Check In`, `checkin` and `CHECK  IN` are all [`Action::CheckIn`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let squashed: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match squashed.as_str() {
            "checkin" => Self::CheckIn,
            "checkout" => Self::CheckOut,
            _ => Self::Other,
        }
    }
}

/// Snapshot of one timesheet row as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// 1-based data row number in the source.
    pub row: usize,
    pub time: Option<NaiveDateTime>,
    /// Name exactly as written in the sheet.
    pub name: String,
    /// Action text exactly as written in the sheet.
    pub action: String,
    pub state_id: Option<i64>,
}

impl RawEvent {
    #[must_use]
    pub fn kind(&self) -> Action {
        Action::parse(&self.action)
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self
            .time
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        let id = self.state_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        write!(
            f,
            "row {}: {time}  {}  {}  {id}",
            self.row, self.name, self.action
        )
    }
}

/// One paired login/logout interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Session {
    #[must_use]
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    #[must_use]
    pub fn hours(&self) -> f64 {
        self.seconds() as f64 / 3600.0
    }
}

/// Timesheet events that could not be paired into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Checked in while already checked in (client crash, double click).
    Crash,
    /// Checked out without a check-in inside the period.
    PrePeriod,
    /// Still checked in when the period ended.
    PostPeriod,
    /// Unknown action or unusable row.
    Other,
}

impl AnomalyKind {
    pub const ALL: [Self; 4] = [Self::Crash, Self::PrePeriod, Self::PostPeriod, Self::Other];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crash => "crash",
            Self::PrePeriod => "pre",
            Self::PostPeriod => "post",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw rows grouped by anomaly kind, each bucket in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomalies {
    pub crash: Vec<RawEvent>,
    pub pre_period: Vec<RawEvent>,
    pub post_period: Vec<RawEvent>,
    pub other: Vec<RawEvent>,
}

impl Anomalies {
    pub fn push(&mut self, kind: AnomalyKind, event: RawEvent) {
        self.bucket_mut(kind).push(event);
    }

    #[must_use]
    pub fn get(&self, kind: AnomalyKind) -> &[RawEvent] {
        match kind {
            AnomalyKind::Crash => &self.crash,
            AnomalyKind::PrePeriod => &self.pre_period,
            AnomalyKind::PostPeriod => &self.post_period,
            AnomalyKind::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, kind: AnomalyKind) -> &mut Vec<RawEvent> {
        match kind {
            AnomalyKind::Crash => &mut self.crash,
            AnomalyKind::PrePeriod => &mut self.pre_period,
            AnomalyKind::PostPeriod => &mut self.post_period,
            AnomalyKind::Other => &mut self.other,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        AnomalyKind::ALL.iter().map(|k| self.get(*k).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All anomalies, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = (AnomalyKind, &RawEvent)> {
        AnomalyKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |ev| (kind, ev)))
    }
}

/// One incident a person started or was involved in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentEntry {
    pub id: String,
    pub time: NaiveDateTime,
}

/// Roster columns for one row; `None` means the cell was blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterAttributes {
    pub rank: Option<String>,
    pub position: Option<String>,
    pub callsign: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
}

/// Everything known about one person after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Canonical name; the registry key.
    pub name: String,
    /// Fixed by whichever ingestor created the record.
    pub id: i64,

    pub rank: String,
    pub position: String,
    pub callsign: String,
    pub department: String,
    pub shift: String,

    /// Check-in time of the session currently open, if any.
    #[serde(default)]
    open_since: Option<NaiveDateTime>,
    /// Last timesheet row seen for this person.
    #[serde(default)]
    last_event: Option<RawEvent>,
    pub sessions: Vec<Session>,
    pub anomalies: Anomalies,
    /// Sum of closed session durations.
    pub logged_hours: f64,

    pub incidents: Vec<IncidentEntry>,

    #[serde(default)]
    pub stats: WorkStats,
}

impl PersonRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id,
            rank: String::new(),
            position: String::new(),
            callsign: String::new(),
            department: String::new(),
            shift: String::new(),
            open_since: None,
            last_event: None,
            sessions: Vec::new(),
            anomalies: Anomalies::default(),
            logged_hours: 0.0,
            incidents: Vec::new(),
            stats: WorkStats::default(),
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.open_since.is_some()
    }

    #[must_use]
    pub const fn open_since(&self) -> Option<NaiveDateTime> {
        self.open_since
    }

    #[must_use]
    pub const fn last_event(&self) -> Option<&RawEvent> {
        self.last_event.as_ref()
    }

    /// Login times of the closed sessions, in order.
    pub fn logins(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.sessions.iter().map(|s| s.start)
    }

    /// Logout times of the closed sessions, in order.
    pub fn logouts(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.sessions.iter().map(|s| s.end)
    }

    /// Overwrite roster fields with the non-blank values in `attrs`.
    pub fn merge_roster(&mut self, attrs: &RosterAttributes) {
        fn set(field: &mut String, value: Option<&String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                field.clone_from(v);
            }
        }
        set(&mut self.rank, attrs.rank.as_ref());
        set(&mut self.position, attrs.position.as_ref());
        set(&mut self.callsign, attrs.callsign.as_ref());
        set(&mut self.department, attrs.department.as_ref());
        set(&mut self.shift, attrs.shift.as_ref());
    }

    pub(crate) fn note_event(&mut self, event: &RawEvent) {
        self.last_event = Some(event.clone());
    }

    pub(crate) fn open_session(&mut self, at: NaiveDateTime) {
        self.open_since = Some(at);
    }

    /// Close the open session at `at`, append it, and add its hours.
    pub(crate) fn close_session(&mut self, at: NaiveDateTime) -> Option<Session> {
        let start = self.open_since.take()?;
        let session = Session { start, end: at };
        self.logged_hours += session.hours();
        self.sessions.push(session);
        Some(session)
    }
}

impl fmt::Display for PersonRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.id)
    }
}
