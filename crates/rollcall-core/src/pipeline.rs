//! One batch run: every available sheet folded into a fresh registry, then
//! aggregated.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::analyze_registry;
use crate::config::Config;
use crate::error::IngestError;
use crate::ingest::{
    IncidentReport, Period, RosterReport, TimesheetReport, ingest_incidents, ingest_roster,
    ingest_timesheet,
};
use crate::model::Registry;
use crate::resolve::{Advisory, NameResolver};
use crate::table::Table;

/// Loaded input tables. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub roster: Option<Table>,
    pub timesheet: Option<Table>,
    pub incidents: Option<Table>,
}

/// Output of [`Pipeline::run`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    pub registry: Registry,
    pub roster: Option<RosterReport>,
    pub timesheet: Option<TimesheetReport>,
    pub incidents: Option<IncidentReport>,
    /// Near-miss name pairs kept apart during resolution.
    pub advisories: Vec<Advisory>,
}

impl Batch {
    /// First and last timesheet timestamps, when a timesheet was read.
    #[must_use]
    pub fn period(&self) -> Option<Period> {
        self.timesheet.as_ref().and_then(|t| t.period)
    }
}

/// Runs the ingestors in order against one registry.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Roster, then timesheet, then incidents, then aggregation.
    ///
    /// The roster goes first so that its IDs win; incident-only people are
    /// created last with ID 0.
    ///
    /// # Errors
    ///
    /// Propagates the first [`IngestError`] from any ingestor.
    pub fn run(&self, sources: &Sources) -> Result<Batch, IngestError> {
        let mut registry = Registry::new();
        let mut resolver = NameResolver::new(&self.config.matching);
        let mut batch = Batch::default();

        match &sources.roster {
            Some(table) => {
                batch.roster = Some(ingest_roster(
                    table,
                    &self.config.roster,
                    &mut registry,
                    &mut resolver,
                )?);
            }
            None => info!("no roster source; skipping"),
        }

        match &sources.timesheet {
            Some(table) => {
                batch.timesheet = Some(ingest_timesheet(
                    table,
                    &self.config.timesheet,
                    &mut registry,
                    &mut resolver,
                )?);
            }
            None => info!("no timesheet source; skipping"),
        }

        match &sources.incidents {
            Some(table) => {
                batch.incidents = Some(ingest_incidents(
                    table,
                    &self.config.incidents,
                    &mut registry,
                    &mut resolver,
                )?);
            }
            None => info!("no incident source; skipping"),
        }

        analyze_registry(&mut registry);
        info!(
            people = registry.len(),
            advisories = resolver.advisories().len(),
            "batch complete"
        );

        batch.registry = registry;
        batch.advisories = resolver.take_advisories();
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn empty_sources_give_empty_batch() {
        let batch = Pipeline::default().run(&Sources::default()).expect("runs");
        assert!(batch.registry.is_empty());
        assert!(batch.roster.is_none());
        assert!(batch.period().is_none());
    }

    #[test]
    fn roster_id_wins_over_incident_default() {
        let mut roster = Table::new("roster", ["Name", "StateID"]);
        roster.push_row(vec![Cell::from("Ann Lee"), Cell::Number(41.0)]);
        let mut incidents = Table::new("_Incidents", ["IncidentNr", "StartedBy", "Date"]);
        incidents.push_row(vec![
            Cell::Number(9.0),
            Cell::from("Ann Lee"),
            Cell::from("2024-03-04 10:00:00"),
        ]);

        let batch = Pipeline::default()
            .run(&Sources {
                roster: Some(roster),
                timesheet: None,
                incidents: Some(incidents),
            })
            .expect("runs");
        let ann = batch.registry.get("Ann Lee").expect("present");
        assert_eq!(ann.id, 41);
        assert_eq!(ann.incidents.len(), 1);
        assert_eq!(ann.stats.shift_incidents.shift1, 1);
    }
}
