use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "rollcall.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub timesheet: TimesheetConfig,
    #[serde(default)]
    pub incidents: IncidentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Ratios strictly above this fold a name into an existing identity.
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f64,
    /// Ratios strictly above this (and not merged) raise an advisory.
    #[serde(default = "default_advisory_threshold")]
    pub advisory_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_merge_threshold(),
            advisory_threshold: default_advisory_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterConfig {
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_roster_id_column")]
    pub id_column: String,
    #[serde(default = "default_rank_column")]
    pub rank_column: String,
    #[serde(default = "default_position_column")]
    pub position_column: String,
    #[serde(default = "default_callsign_column")]
    pub callsign_column: String,
    #[serde(default = "default_department_column")]
    pub department_column: String,
    #[serde(default = "default_shift_column")]
    pub shift_column: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            skip_rows: 0,
            name_column: default_name_column(),
            id_column: default_roster_id_column(),
            rank_column: default_rank_column(),
            position_column: default_position_column(),
            callsign_column: default_callsign_column(),
            department_column: default_department_column(),
            shift_column: default_shift_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimesheetConfig {
    #[serde(default)]
    pub sheet: Option<String>,
    /// Preamble rows above the header (the clock-in export puts three there).
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_action_column")]
    pub action_column: String,
    #[serde(default = "default_timesheet_id_column")]
    pub id_column: String,
}

impl Default for TimesheetConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            skip_rows: 0,
            time_column: default_time_column(),
            name_column: default_name_column(),
            action_column: default_action_column(),
            id_column: default_timesheet_id_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentConfig {
    #[serde(default = "default_incident_sheet")]
    pub sheet: Option<String>,
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default = "default_incident_id_column")]
    pub id_column: String,
    #[serde(default = "default_started_by_column")]
    pub started_by_column: String,
    #[serde(default = "default_involved_column")]
    pub involved_column: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            sheet: default_incident_sheet(),
            skip_rows: 0,
            id_column: default_incident_id_column(),
            started_by_column: default_started_by_column(),
            involved_column: default_involved_column(),
            date_column: default_date_column(),
            date_format: default_date_format(),
        }
    }
}

/// Load configuration.
///
/// An explicit path must exist. Without one, `rollcall.toml` in `root` is
/// used when present, and defaults otherwise.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// thresholds are out of order.
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<Config> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = root.join(CONFIG_FILE_NAME);
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    validate(&config).with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let m = &config.matching;
    if !(0.0..=1.0).contains(&m.merge_threshold) || !(0.0..=1.0).contains(&m.advisory_threshold) {
        anyhow::bail!("matching thresholds must lie in [0, 1]");
    }
    if m.advisory_threshold > m.merge_threshold {
        anyhow::bail!(
            "advisory_threshold ({}) must not exceed merge_threshold ({})",
            m.advisory_threshold,
            m.merge_threshold
        );
    }
    Ok(())
}

const fn default_merge_threshold() -> f64 {
    0.9
}

const fn default_advisory_threshold() -> f64 {
    0.75
}

fn default_name_column() -> String {
    "Name".to_string()
}

fn default_roster_id_column() -> String {
    "StateID".to_string()
}

fn default_timesheet_id_column() -> String {
    "State ID".to_string()
}

fn default_rank_column() -> String {
    "Rank".to_string()
}

fn default_position_column() -> String {
    "Position".to_string()
}

fn default_callsign_column() -> String {
    "Callsign".to_string()
}

fn default_department_column() -> String {
    "Department".to_string()
}

fn default_shift_column() -> String {
    "Shift".to_string()
}

fn default_time_column() -> String {
    "Time".to_string()
}

fn default_action_column() -> String {
    "Action".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_incident_sheet() -> Option<String> {
    Some("_Incidents".to_string())
}

fn default_incident_id_column() -> String {
    "IncidentNr".to_string()
}

fn default_started_by_column() -> String {
    "StartedBy".to_string()
}

fn default_involved_column() -> String {
    "Involved".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_config(None, root.path()).expect("load should succeed");
        assert_eq!(cfg, Config::default());
        assert!((cfg.matching.merge_threshold - 0.9).abs() < f64::EPSILON);
        assert!((cfg.matching.advisory_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(cfg.timesheet.id_column, "State ID");
        assert_eq!(cfg.roster.id_column, "StateID");
        assert_eq!(cfg.incidents.sheet.as_deref(), Some("_Incidents"));
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(
            root.path().join(CONFIG_FILE_NAME),
            r#"
[matching]
merge_threshold = 0.95

[timesheet]
skip_rows = 3
name_column = "Officer"
"#,
        )
        .expect("write config");

        let cfg = load_config(None, root.path()).expect("load should succeed");
        assert!((cfg.matching.merge_threshold - 0.95).abs() < f64::EPSILON);
        assert!((cfg.matching.advisory_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(cfg.timesheet.skip_rows, 3);
        assert_eq!(cfg.timesheet.name_column, "Officer");
        assert_eq!(cfg.timesheet.action_column, "Action");
        assert_eq!(cfg.roster, RosterConfig::default());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let missing = root.path().join("nope.toml");
        assert!(load_config(Some(&missing), root.path()).is_err());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let path = root.path().join("custom.toml");
        std::fs::write(
            &path,
            "[matching]\nmerge_threshold = 0.6\nadvisory_threshold = 0.8\n",
        )
        .expect("write config");
        let err = load_config(Some(&path), root.path()).expect_err("must reject");
        assert!(format!("{err:#}").contains("advisory_threshold"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "[matching\n").expect("write");
        assert!(load_config(None, root.path()).is_err());
    }
}
