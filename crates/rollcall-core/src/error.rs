use std::fmt;

/// Machine-readable error codes for scripted callers and report consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SourceNotFound,
    SourceUnreadable,
    MissingColumn,
    MalformedDate,
    PersonNotFound,
    SnapshotWriteFailed,
    SnapshotReadFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::SourceNotFound => "E2001",
            Self::SourceUnreadable => "E2002",
            Self::MissingColumn => "E2003",
            Self::MalformedDate => "E3001",
            Self::PersonNotFound => "E4001",
            Self::SnapshotWriteFailed => "E5001",
            Self::SnapshotReadFailed => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SourceNotFound => "Input source not found",
            Self::SourceUnreadable => "Input source could not be read",
            Self::MissingColumn => "Required column missing from input",
            Self::MalformedDate => "Malformed incident date",
            Self::PersonNotFound => "Person not found",
            Self::SnapshotWriteFailed => "Snapshot write failed",
            Self::SnapshotReadFailed => "Snapshot read failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in rollcall.toml and retry."),
            Self::SourceNotFound => Some("Check the input path and the configured sheet name."),
            Self::SourceUnreadable => Some("Export the sheet as UTF-8 CSV and retry."),
            Self::MissingColumn => {
                Some("Rename the header or set the column name in rollcall.toml.")
            }
            Self::MalformedDate => {
                Some("Incident dates must look like `2024-03-04 10:00:00`; fix the row and rerun.")
            }
            Self::PersonNotFound => Some(
                "Names are matched after normalization; try `rollcall analyze` to list known names.",
            ),
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::SnapshotReadFailed => {
                Some("Regenerate the snapshot with `rollcall analyze --snapshot`.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that abort an ingestion pass.
///
/// Row-level problems that the batch tolerates (missing names, unpairable
/// timesheet events) are not errors; they are skipped or classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// A column the ingestor depends on is absent from the source header.
    #[error("{source_name}: required column `{column}` not found")]
    MissingColumn { source_name: String, column: String },

    /// An incident row carries a date that does not match the configured format.
    #[error("incident row {row}: malformed date `{value}` (expected format `{format}`)")]
    MalformedDate {
        row: usize,
        value: String,
        format: String,
    },
}

impl IngestError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn { .. } => ErrorCode::MissingColumn,
            Self::MalformedDate { .. } => ErrorCode::MalformedDate,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
