//! `rollcall anomalies`: timesheet rows that could not be paired.

use std::io::Write;

use chrono::NaiveDateTime;
use clap::{Args, ValueEnum};
use rollcall_core::config::Config;
use rollcall_core::model::{AnomalyKind, Registry};
use serde::Serialize;

use super::{InputArgs, load_batch};
use crate::output::{OutputMode, pretty_section, render_mode};

/// Anomaly filter for the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Checked in while already checked in.
    Crash,
    /// Checked out without a check-in.
    Pre,
    /// Still checked in at the end.
    Post,
    /// Unknown action or missing time.
    Other,
}

impl From<KindArg> for AnomalyKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Crash => Self::Crash,
            KindArg::Pre => Self::PrePeriod,
            KindArg::Post => Self::PostPeriod,
            KindArg::Other => Self::Other,
        }
    }
}

/// Arguments for `rollcall anomalies`.
#[derive(Args, Debug, Default)]
pub struct AnomaliesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only show anomalies of this kind.
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,
}

/// One anomaly row as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyLine {
    pub person: String,
    pub kind: AnomalyKind,
    pub row: usize,
    pub time: Option<NaiveDateTime>,
    pub name: String,
    pub action: String,
    pub state_id: Option<i64>,
}

/// Payload for `rollcall anomalies`.
#[derive(Debug, Serialize)]
pub struct AnomalyListing {
    pub total: usize,
    pub anomalies: Vec<AnomalyLine>,
}

/// Flatten the registry's anomalies, person by person in registration order.
pub fn collect_anomalies(registry: &Registry, kind: Option<AnomalyKind>) -> Vec<AnomalyLine> {
    registry
        .iter()
        .flat_map(|p| {
            p.anomalies
                .iter()
                .filter(move |(k, _)| kind.is_none_or(|want| *k == want))
                .map(move |(k, ev)| AnomalyLine {
                    person: p.name.clone(),
                    kind: k,
                    row: ev.row,
                    time: ev.time,
                    name: ev.name.clone(),
                    action: ev.action.clone(),
                    state_id: ev.state_id,
                })
        })
        .collect()
}

/// Execute `rollcall anomalies`.
pub fn run_anomalies(
    args: &AnomaliesArgs,
    config: &Config,
    output: OutputMode,
) -> anyhow::Result<()> {
    let batch = load_batch(&args.input, config, output)?;
    let anomalies = collect_anomalies(&batch.registry, args.kind.map(AnomalyKind::from));
    let listing = AnomalyListing {
        total: anomalies.len(),
        anomalies,
    };
    render_mode(output, &listing, render_anomalies_text, render_anomalies_pretty)
}

fn fmt_time(time: Option<NaiveDateTime>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.to_string())
}

fn render_anomalies_text(listing: &AnomalyListing, w: &mut dyn Write) -> std::io::Result<()> {
    for l in &listing.anomalies {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            l.person,
            l.kind,
            l.row,
            fmt_time(l.time),
            l.name,
            l.action
        )?;
    }
    Ok(())
}

fn render_anomalies_pretty(listing: &AnomalyListing, w: &mut dyn Write) -> std::io::Result<()> {
    if listing.anomalies.is_empty() {
        return writeln!(w, "No anomalies.");
    }
    let mut current: Option<&str> = None;
    for l in &listing.anomalies {
        if current != Some(l.person.as_str()) {
            if current.is_some() {
                writeln!(w)?;
            }
            pretty_section(w, &l.person)?;
            current = Some(&l.person);
        }
        writeln!(
            w,
            "  {:<6} row {:<5} {:<19}  {}",
            l.kind.as_str(),
            l.row,
            fmt_time(l.time),
            l.action
        )?;
    }
    Ok(())
}
