//! Incident log: who started or was involved in each incident, and when.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cell_at;
use crate::config::IncidentConfig;
use crate::error::IngestError;
use crate::model::{INCIDENT_ONLY_ID, IncidentEntry, Registry};
use crate::resolve::{NameResolver, normalize_name};
use crate::table::{Cell, Table};

/// What one incident pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub rows_read: usize,
    pub rows_applied: usize,
    /// Rows that named nobody.
    pub rows_skipped: usize,
    /// Incident entries appended across all people.
    pub entries_added: usize,
    pub records_created: usize,
}

/// Read the incident date from a typed timestamp cell or from text in
/// `format`.
fn incident_time(cell: &Cell, row: usize, format: &str) -> Result<NaiveDateTime, IngestError> {
    match cell {
        Cell::Timestamp(t) => Ok(*t),
        Cell::Text(s) => NaiveDateTime::parse_from_str(s.trim(), format).map_err(|_| {
            IngestError::MalformedDate {
                row,
                value: s.clone(),
                format: format.to_string(),
            }
        }),
        other => Err(IngestError::MalformedDate {
            row,
            value: other.display(),
            format: format.to_string(),
        }),
    }
}

/// Attach every incident to the people who started it or were involved.
///
/// The involved column holds a comma-separated list and may be blank. A
/// person named twice on one row (initiator and involved, or two spellings
/// of the same name) gets the incident once.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] when the ID, initiator, or date
/// column is absent, and [`IngestError::MalformedDate`] for the first row
/// naming someone whose date cannot be read.
pub fn ingest_incidents(
    table: &Table,
    config: &IncidentConfig,
    registry: &mut Registry,
    resolver: &mut NameResolver,
) -> Result<IncidentReport, IngestError> {
    let id_col = table.require_column(&config.id_column)?;
    let started_col = table.require_column(&config.started_by_column)?;
    let date_col = table.require_column(&config.date_column)?;
    let involved_col = table.column(&config.involved_column);

    let mut report = IncidentReport::default();

    for (row, cells) in table.rows() {
        report.rows_read += 1;

        let involved = cell_at(cells, involved_col).as_text().unwrap_or_default();
        let raw_names: Vec<&str> = cells[started_col]
            .as_text()
            .into_iter()
            .chain(involved.split(','))
            .filter(|raw| !normalize_name(raw).is_empty())
            .collect();

        if raw_names.is_empty() {
            debug!(row, "incident row names nobody; skipping");
            report.rows_skipped += 1;
            continue;
        }

        let time = incident_time(&cells[date_col], row, &config.date_format)?;
        let id = cells[id_col].display();

        // One name at a time, so a later spelling can merge into a record an
        // earlier name on the same row just created.
        let mut seen: Vec<String> = Vec::new();
        for raw in raw_names {
            let Some(resolution) = registry.resolve(resolver, raw) else {
                continue;
            };
            let name = resolution.into_canonical();
            if seen.contains(&name) {
                continue;
            }
            let (person, created) = registry.get_or_create(&name, INCIDENT_ONLY_ID);
            person.incidents.push(IncidentEntry {
                id: id.clone(),
                time,
            });
            if created {
                report.records_created += 1;
            }
            report.entries_added += 1;
            seen.push(name);
        }
        report.rows_applied += 1;
    }

    info!(
        source = %table.source_name,
        applied = report.rows_applied,
        entries = report.entries_added,
        created = report.records_created,
        "incidents ingested"
    );
    Ok(report)
}
