//! CSV-backed [`TableSource`].
//!
//! A file path is read directly. A directory path stands for a workbook
//! exported sheet by sheet, and resolves to `<dir>/<sheet>.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use rollcall_core::table::{Cell, Table, TableError, TableSource};
use tracing::debug;

/// Reads sheets from CSV exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSource;

/// Path of the CSV file holding `sheet` under `path`.
fn sheet_path(path: &Path, sheet: Option<&str>) -> Result<PathBuf, TableError> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    match sheet {
        Some(sheet) => Ok(path.join(format!("{sheet}.csv"))),
        None => Err(TableError::Unreadable {
            path: path.to_path_buf(),
            reason: "a directory needs a sheet name; set `sheet` in rollcall.toml".to_string(),
        }),
    }
}

/// Everything after the first `n` lines of `text`.
fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}

/// Type a raw CSV field: blank, number, or text.
///
/// Dates stay text. CSV carries no date type, so each ingestor reads its own
/// date columns in the layout it expects.
fn typed_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    // `parse::<f64>` also accepts "nan" and "inf", which are plausible names.
    let numeric = trimmed.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric && let Ok(n) = trimmed.parse::<f64>() {
        return Cell::Number(n);
    }
    Cell::Text(raw.to_string())
}

impl TableSource for CsvSource {
    fn load(
        &self,
        path: &Path,
        sheet: Option<&str>,
        skip_rows: usize,
    ) -> Result<Table, TableError> {
        let file = sheet_path(path, sheet)?;
        if !file.is_file() {
            return Err(TableError::NotFound { path: file });
        }
        let unreadable = |reason: String| TableError::Unreadable {
            path: file.clone(),
            reason,
        };

        let text = fs::read_to_string(&file).map_err(|e| unreadable(e.to_string()))?;
        let body = skip_lines(&text, skip_rows);

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| unreadable(format!("bad header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Table::new(file.display().to_string(), headers);
        for result in rdr.records() {
            let record = result.map_err(|e| unreadable(e.to_string()))?;
            table.push_row(record.iter().map(typed_cell).collect());
        }

        debug!(path = %file.display(), rows = table.len(), "loaded sheet");
        Ok(table)
    }
}
