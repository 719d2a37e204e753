//! `rollcall analyze`: full batch run with the overview report.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use rollcall_core::config::Config;
use rollcall_core::ingest::{AnomalyCounts, Period};
use rollcall_core::report::{CSV_HEADERS, ReportRow, overview_rows, overview_text};
use rollcall_core::resolve::Advisory;
use rollcall_core::snapshot::write_snapshot;
use serde::Serialize;
use tracing::info;

use super::{InputArgs, load_batch};
use crate::output::{
    CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode,
};

/// Arguments for `rollcall analyze`.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Overview CSV path [default: `<timesheet stem>_overview.csv` beside the timesheet].
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Do not write the overview CSV.
    #[arg(long, conflicts_with = "out")]
    pub no_csv: bool,

    /// Also save the analyzed batch as a JSON snapshot.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,
}

/// Report payload for `rollcall analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeReport {
    pub people: usize,
    pub sessions: usize,
    pub anomalies: AnomalyCounts,
    pub period: Option<Period>,
    pub advisories: Vec<Advisory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview_csv: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    pub rows: Vec<ReportRow>,
    #[serde(skip)]
    overview: String,
}

/// Default CSV path: the timesheet's path with its extension replaced by
/// `_overview.csv`.
fn default_csv_path(timesheet: &Path) -> Option<PathBuf> {
    let stem = timesheet.file_stem()?.to_string_lossy();
    Some(timesheet.with_file_name(format!("{stem}_overview.csv")))
}

/// Write report rows under the overview header (written even with no rows).
fn write_overview_csv(path: &Path, rows: &[ReportRow]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("create overview csv {}", path.display()))?;
    writer.write_record(CSV_HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Execute `rollcall analyze`.
pub fn run_analyze(args: &AnalyzeArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let batch = load_batch(&args.input, config, output)?;
    let rows = overview_rows(&batch.registry);

    let csv_path = if args.no_csv {
        None
    } else {
        args.out
            .clone()
            .or_else(|| args.input.timesheet.as_deref().and_then(default_csv_path))
    };
    if let Some(path) = &csv_path {
        write_overview_csv(path, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "overview written");
    }

    if let Some(path) = &args.snapshot
        && let Err(err) = write_snapshot(&batch, path)
    {
        render_error(output, &CliError::from(&err))?;
        return Err(err.into());
    }

    let timesheet = batch.timesheet.clone().unwrap_or_default();
    let report = AnalyzeReport {
        people: batch.registry.len(),
        sessions: timesheet.sessions,
        anomalies: timesheet.anomalies,
        period: batch.period(),
        advisories: batch.advisories.clone(),
        overview_csv: csv_path,
        snapshot: args.snapshot.clone(),
        rows,
        overview: overview_text(&batch.registry),
    };

    render_mode(output, &report, render_analyze_text, render_analyze_pretty)
}

fn render_analyze_text(report: &AnalyzeReport, w: &mut dyn Write) -> std::io::Result<()> {
    write!(w, "{}", report.overview)
}

fn render_analyze_pretty(report: &AnalyzeReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Clocked time (hrs)")?;
    write!(w, "{}", report.overview)?;
    writeln!(w)?;

    pretty_section(w, "Batch")?;
    pretty_kv(w, "people", report.people.to_string())?;
    pretty_kv(w, "sessions", report.sessions.to_string())?;
    if let Some(period) = report.period {
        pretty_kv(w, "period", format!("{}  ->  {}", period.start, period.end))?;
    }
    let a = &report.anomalies;
    pretty_kv(
        w,
        "anomalies",
        format!(
            "crash {}  pre {}  post {}  other {}",
            a.crash, a.pre_period, a.post_period, a.other
        ),
    )?;
    if let Some(path) = &report.overview_csv {
        pretty_kv(w, "overview csv", path.display().to_string())?;
    }
    if let Some(path) = &report.snapshot {
        pretty_kv(w, "snapshot", path.display().to_string())?;
    }

    if !report.advisories.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Similar names kept apart (review)")?;
        for adv in &report.advisories {
            writeln!(w, "  {:.3}  {}  ~  {}", adv.ratio, adv.name, adv.candidate)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_path_sits_beside_timesheet() {
        assert_eq!(
            default_csv_path(Path::new("data/PDHoursMar1Apr20.csv")),
            Some(PathBuf::from("data/PDHoursMar1Apr20_overview.csv"))
        );
        assert_eq!(
            default_csv_path(Path::new("hours")),
            Some(PathBuf::from("hours_overview.csv"))
        );
    }
}
