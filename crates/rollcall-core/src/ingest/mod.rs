//! Ingestors that fold each input sheet into the shared [`Registry`].
//!
//! They run in a fixed order, roster, then timesheet, then incidents, because
//! whichever one creates a record fixes its ID. Each takes the registry and
//! the resolver by `&mut` and returns a report of what it did.
//!
//! [`Registry`]: crate::model::Registry

pub mod incidents;
pub mod roster;
pub mod timesheet;

pub use incidents::{IncidentReport, ingest_incidents};
pub use roster::{RosterReport, ingest_roster};
pub use timesheet::{AnomalyCounts, Period, TimesheetReport, ingest_timesheet};

use crate::table::Cell;

/// Cell at `col`, or [`Cell::Empty`] when the column is absent.
fn cell_at(cells: &[Cell], col: Option<usize>) -> &Cell {
    static EMPTY: Cell = Cell::Empty;
    col.and_then(|i| cells.get(i)).unwrap_or(&EMPTY)
}

/// Cell at `col` as it reads in the sheet, or `None` when blank.
///
/// Numeric cells count: a roster `Shift` of `1` is kept as `"1"`.
fn text_at(cells: &[Cell], col: Option<usize>) -> Option<String> {
    let shown = cell_at(cells, col).display();
    let trimmed = shown.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
