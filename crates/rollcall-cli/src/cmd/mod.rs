pub mod analyze;
pub mod anomalies;
pub mod completions;
pub mod person;

use std::path::{Path, PathBuf};

use clap::Args;
use rollcall_core::config::Config;
use rollcall_core::snapshot::read_snapshot;
use rollcall_core::table::{Table, TableSource};
use rollcall_core::{Batch, Pipeline, Sources};
use tracing::info;

use crate::output::{CliError, OutputMode, render_error};
use crate::source::CsvSource;

/// Where a command gets its data: the three sheets, or a saved snapshot.
#[derive(Args, Debug, Default, Clone)]
pub struct InputArgs {
    /// Timesheet export (CSV file, or a directory of per-sheet CSVs).
    #[arg(short, long, value_name = "PATH")]
    pub timesheet: Option<PathBuf>,

    /// Roster export.
    #[arg(short, long, value_name = "PATH")]
    pub roster: Option<PathBuf>,

    /// Incident log export.
    #[arg(short, long, value_name = "PATH")]
    pub incidents: Option<PathBuf>,

    /// Read a snapshot written by `rollcall analyze --snapshot` instead of sheets.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["timesheet", "roster", "incidents"])]
    pub from_snapshot: Option<PathBuf>,
}

impl InputArgs {
    fn is_empty(&self) -> bool {
        self.timesheet.is_none()
            && self.roster.is_none()
            && self.incidents.is_none()
            && self.from_snapshot.is_none()
    }
}

fn load_table(
    output: OutputMode,
    path: Option<&Path>,
    sheet: Option<&str>,
    skip_rows: usize,
) -> anyhow::Result<Option<Table>> {
    let Some(path) = path else {
        return Ok(None);
    };
    match CsvSource.load(path, sheet, skip_rows) {
        Ok(table) => Ok(Some(table)),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}

/// Build a batch from the command's inputs.
///
/// Errors are rendered in the requested mode before being returned.
pub fn load_batch(input: &InputArgs, config: &Config, output: OutputMode) -> anyhow::Result<Batch> {
    if input.is_empty() {
        render_error(
            output,
            &CliError::with_details(
                "no input given",
                "pass --timesheet, --roster, --incidents, or --from-snapshot",
                "no_sources",
            ),
        )?;
        anyhow::bail!("no input given");
    }

    if let Some(path) = &input.from_snapshot {
        return match read_snapshot(path) {
            Ok(batch) => {
                info!(path = %path.display(), people = batch.registry.len(), "snapshot loaded");
                Ok(batch)
            }
            Err(err) => {
                render_error(output, &CliError::from(&err))?;
                Err(err.into())
            }
        };
    }

    let sources = Sources {
        roster: load_table(
            output,
            input.roster.as_deref(),
            config.roster.sheet.as_deref(),
            config.roster.skip_rows,
        )?,
        timesheet: load_table(
            output,
            input.timesheet.as_deref(),
            config.timesheet.sheet.as_deref(),
            config.timesheet.skip_rows,
        )?,
        incidents: load_table(
            output,
            input.incidents.as_deref(),
            config.incidents.sheet.as_deref(),
            config.incidents.skip_rows,
        )?,
    };

    match Pipeline::new(config.clone()).run(&sources) {
        Ok(batch) => Ok(batch),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}
