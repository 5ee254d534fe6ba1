use super::{RawTable, TabularSource};
use crate::error::{ReportError, Result};
use crate::types::Cell;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A spreadsheet file read through calamine (xlsx, xlsm, xlsb, xls, ods)
pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook = open_workbook_auto(path).map_err(|e| {
            ReportError::SourceUnavailable(format!(
                "failed to open workbook '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl TabularSource for WorkbookSource {
    fn describe(&self) -> String {
        format!("workbook {}", self.path.display())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawTable> {
        if !self.sheet_names().iter().any(|s| s == name) {
            return Err(ReportError::SourceUnavailable(format!(
                "workbook '{}' has no sheet named '{}'",
                self.path.display(),
                name
            )));
        }

        let range = self.workbook.worksheet_range(name)?;
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(header_text).collect(),
            None => Vec::new(),
        };
        let data: Vec<Vec<Cell>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();

        debug!("Read {} rows from sheet '{}'", data.len(), name);
        Ok(RawTable::new(name, headers, data))
    }
}

fn header_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Map a calamine cell onto the source-neutral [`Cell`]. Error cells (`#N/A`
/// and friends) count as missing values.
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // as_datetime honours the workbook's 1900/1904 date system
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if dt.is_datetime() => Cell::Date(ts),
            _ => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
    }
}
