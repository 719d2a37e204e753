//! JSON snapshot of a finished [`Batch`].
//!
//! The snapshot stores the whole registry, including anomalies and computed
//! stats, so a later `person` or `anomalies` query can skip re-ingestion.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::pipeline::Batch;

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encode/decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}: maximum supported is {SNAPSHOT_VERSION}")]
    UnsupportedVersion(u32),
}

impl SnapshotError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Write { .. } => ErrorCode::SnapshotWriteFailed,
            Self::Read { .. } | Self::Json(_) | Self::UnsupportedVersion(_) => {
                ErrorCode::SnapshotReadFailed
            }
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    batch: &'a Batch,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    batch: Batch,
}

/// Write `batch` to `path` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`SnapshotError::Write`] on I/O failure.
pub fn write_snapshot(batch: &Batch, path: &Path) -> Result<(), SnapshotError> {
    let write_err = |source| SnapshotError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        batch,
    })?;
    fs::write(path, json).map_err(write_err)
}

/// Load a snapshot previously written by [`write_snapshot`].
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a snapshot, or was
/// written by a newer version.
pub fn read_snapshot(path: &Path) -> Result<Batch, SnapshotError> {
    let text = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let envelope: Envelope = serde_json::from_str(&text)?;
    if envelope.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.batch)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    use super::*;
    use crate::model::{AnomalyKind, RawEvent, Session};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
    }

    #[test]
    fn snapshot_keeps_sessions_and_anomalies() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("out").join("batch.json");

        let mut batch = Batch::default();
        let (ann, _) = batch.registry.get_or_create("Ann Lee", 41);
        ann.sessions.push(Session {
            start: ts("2024-03-04 09:00:00"),
            end: ts("2024-03-04 17:00:00"),
        });
        ann.anomalies.push(
            AnomalyKind::Crash,
            RawEvent {
                row: 3,
                time: Some(ts("2024-03-04 10:00:00")),
                name: "Ann Lee".into(),
                action: "Check In".into(),
                state_id: Some(41),
            },
        );

        write_snapshot(&batch, &path).expect("write");
        let back = read_snapshot(&path).expect("read");
        let ann = back.registry.get("Ann Lee").expect("index rebuilt");
        assert_eq!(ann.sessions.len(), 1);
        assert_eq!(ann.anomalies.crash[0].row, 3);
    }

    #[test]
    fn newer_versions_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"{"version": 99, "batch": {"registry": [], "roster": null, "timesheet": null, "incidents": null, "advisories": []}}"#)
            .expect("write");
        let err = read_snapshot(&path).expect_err("too new");
        assert!(matches!(err, SnapshotError::UnsupportedVersion(99)));
        assert_eq!(err.code(), ErrorCode::SnapshotReadFailed);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = read_snapshot(&dir.path().join("nope.json")).expect_err("absent");
        assert!(matches!(err, SnapshotError::Read { .. }));
    }
}
