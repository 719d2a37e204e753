//! Roster sheet: identity plus rank, position, callsign, department, shift.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{cell_at, text_at};
use crate::config::RosterConfig;
use crate::error::IngestError;
use crate::model::{Registry, RosterAttributes, UNKNOWN_ID};
use crate::resolve::NameResolver;
use crate::table::Table;

/// What one roster pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterReport {
    pub rows_read: usize,
    pub rows_applied: usize,
    /// Rows without a usable name.
    pub rows_skipped: usize,
    pub records_created: usize,
}

/// Merge roster rows into `registry`.
///
/// A blank roster cell never erases a value already on the record, and an
/// existing record keeps its ID.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when the name column is absent.
/// Every other column is optional.
pub fn ingest_roster(
    table: &Table,
    config: &RosterConfig,
    registry: &mut Registry,
    resolver: &mut NameResolver,
) -> Result<RosterReport, IngestError> {
    let name_col = table.require_column(&config.name_column)?;
    let id_col = table.column(&config.id_column);
    let rank_col = table.column(&config.rank_column);
    let position_col = table.column(&config.position_column);
    let callsign_col = table.column(&config.callsign_column);
    let department_col = table.column(&config.department_column);
    let shift_col = table.column(&config.shift_column);

    let mut report = RosterReport::default();

    for (row, cells) in table.rows() {
        report.rows_read += 1;

        let resolution = cells[name_col]
            .as_text()
            .and_then(|raw| registry.resolve(resolver, raw));
        let Some(resolution) = resolution else {
            debug!(row, "roster row has no usable name; skipping");
            report.rows_skipped += 1;
            continue;
        };

        let id = cell_at(cells, id_col).as_i64().unwrap_or(UNKNOWN_ID);
        let attrs = RosterAttributes {
            rank: text_at(cells, rank_col),
            position: text_at(cells, position_col),
            callsign: text_at(cells, callsign_col),
            department: text_at(cells, department_col),
            shift: text_at(cells, shift_col),
        };

        let (person, created) = registry.get_or_create(resolution.canonical(), id);
        person.merge_roster(&attrs);
        if created {
            report.records_created += 1;
        }
        report.rows_applied += 1;
    }

    info!(
        source = %table.source_name,
        applied = report.rows_applied,
        skipped = report.rows_skipped,
        created = report.records_created,
        "roster ingested"
    );
    Ok(report)
}
