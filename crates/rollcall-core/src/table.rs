//! Typed tabular input.
//!
//! Every ingestor consumes a [`Table`]: a header of column names plus rows of
//! typed [`Cell`]s, addressed by column name. Where the rows come from
//! (spreadsheet export, CSV, test fixture) is the business of a
//! [`TableSource`] implementation; the core never touches files itself.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, IngestError};

/// Timestamp layouts accepted when a text cell is read as a timestamp.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// One typed field of an input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Non-blank text content, trimmed. Numbers and timestamps are not text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Integer value of a numeric cell or of text holding a number.
    ///
    /// Fractional values are truncated toward zero, matching how a float
    /// column of IDs is read back as integers.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Empty | Self::Timestamp(_) => return None,
        };
        if !value.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(value.trunc() as i64)
    }

    /// Timestamp value of a timestamp cell or of text in a known layout.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Text(s) => parse_timestamp(s),
            Self::Empty | Self::Number(_) => None,
        }
    }

    /// `true` for empty cells and whitespace-only text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Timestamp(_) => false,
        }
    }

    /// Render the cell the way it would appear in a sheet.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Self::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

/// Parse a timestamp string in any of the accepted layouts.
///
/// A bare date (`2024-03-04`) is read as midnight of that day.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A loaded sheet: column names plus typed rows in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Label used in error messages (file path, sheet name).
    pub source_name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<I, S>(source_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_name: source_name.into(),
            columns: columns.into_iter().map(|c| c.into().trim().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with [`Cell::Empty`]; extra cells
    /// beyond the header are dropped.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(cells);
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header, if present.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of `name` in the header.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingColumn`] when the header lacks `name`.
    pub fn require_column(&self, name: &str) -> Result<usize, IngestError> {
        self.column(name).ok_or_else(|| IngestError::MissingColumn {
            source_name: self.source_name.clone(),
            column: name.to_string(),
        })
    }

    /// Iterate rows as `(row_number, cells)`; row numbers start at 1.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, cells)| (i + 1, cells.as_slice()))
    }
}

/// Errors raised by a [`TableSource`].
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

impl TableError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::SourceNotFound,
            Self::Unreadable { .. } => ErrorCode::SourceUnreadable,
        }
    }
}

/// Collaborator that turns a path and sheet name into typed rows.
pub trait TableSource {
    /// Load one sheet.
    ///
    /// `skip_rows` preamble lines are discarded before the header row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] when the sheet is missing or cannot be parsed.
    fn load(&self, path: &Path, sheet: Option<&str>, skip_rows: usize)
    -> Result<Table, TableError>;
}
