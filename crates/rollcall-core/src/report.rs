//! Report rows and text views over an analyzed [`Registry`].
//!
//! Nothing here writes files. The CLI decides where rows go and how
//! (CSV, JSON, terminal).

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::model::{PersonRecord, Registry};

/// One line of the overview report.
///
/// Field names serialize to the overview CSV header. Spreads are absent
/// when a person has fewer than three weeks of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CID")]
    pub id: i64,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Rank")]
    pub rank: String,
    #[serde(rename = "Time Worked (hrs)")]
    pub time_worked: f64,
    #[serde(rename = "Shift 1 (hrs)")]
    pub shift1_hours: f64,
    #[serde(rename = "Shift 2 (hrs)")]
    pub shift2_hours: f64,
    #[serde(rename = "Shift 3 (hrs)")]
    pub shift3_hours: f64,
    #[serde(rename = "Worked per Week (hrs)")]
    pub weekly_hours_mean: Option<f64>,
    #[serde(rename = "Stdev (hrs)")]
    pub weekly_hours_stdev: Option<f64>,
    #[serde(rename = "Total Incidents")]
    pub incidents: usize,
    #[serde(rename = "Shift 1 Inc")]
    pub shift1_incidents: u32,
    #[serde(rename = "Shift 2 Inc")]
    pub shift2_incidents: u32,
    #[serde(rename = "Shift 3 Inc")]
    pub shift3_incidents: u32,
    #[serde(rename = "Average per Week (Inc)")]
    pub weekly_incidents_mean: Option<f64>,
    #[serde(rename = "Stdev (Inc)")]
    pub weekly_incidents_stdev: Option<f64>,
}

/// Overview CSV header, in column order.
pub const CSV_HEADERS: [&str; 16] = [
    "Name",
    "CID",
    "Department",
    "Rank",
    "Time Worked (hrs)",
    "Shift 1 (hrs)",
    "Shift 2 (hrs)",
    "Shift 3 (hrs)",
    "Worked per Week (hrs)",
    "Stdev (hrs)",
    "Total Incidents",
    "Shift 1 Inc",
    "Shift 2 Inc",
    "Shift 3 Inc",
    "Average per Week (Inc)",
    "Stdev (Inc)",
];

impl From<&PersonRecord> for ReportRow {
    fn from(p: &PersonRecord) -> Self {
        let hours = p.stats.weekly_hours();
        let incidents = p.stats.weekly_incidents();
        Self {
            name: p.name.clone(),
            id: p.id,
            department: p.department.clone(),
            rank: p.rank.clone(),
            time_worked: p.logged_hours,
            shift1_hours: p.stats.shift_hours.shift1,
            shift2_hours: p.stats.shift_hours.shift2,
            shift3_hours: p.stats.shift_hours.shift3,
            weekly_hours_mean: hours.map(|s| s.mean),
            weekly_hours_stdev: hours.map(|s| s.stdev),
            incidents: p.incidents.len(),
            shift1_incidents: p.stats.shift_incidents.shift1,
            shift2_incidents: p.stats.shift_incidents.shift2,
            shift3_incidents: p.stats.shift_incidents.shift3,
            weekly_incidents_mean: incidents.map(|s| s.mean),
            weekly_incidents_stdev: incidents.map(|s| s.stdev),
        }
    }
}

/// One row per person, most logged time first.
#[must_use]
pub fn overview_rows(registry: &Registry) -> Vec<ReportRow> {
    registry
        .by_logged_time()
        .into_iter()
        .map(ReportRow::from)
        .collect()
}

/// Fixed-width hours overview, one line per person with logged time.
#[must_use]
pub fn overview_text(registry: &Registry) -> String {
    let mut out = String::new();
    for p in registry.by_logged_time() {
        if p.logged_hours > 0.0 {
            let _ = writeln!(out, "{:17.2}     {}", p.logged_hours, p.name);
        }
    }
    out
}

/// Clocked time followed by every closed session.
#[must_use]
pub fn session_detail(person: &PersonRecord) -> String {
    let mut out = format!("{} - clocked time: {:>17.2}\n\n", person.name, person.logged_hours);
    for s in &person.sessions {
        let _ = writeln!(out, "in: {}  -  out: {}", s.start, s.end);
    }
    out
}
