// Pipeline ingestion: tabular sources and the loader that maps them onto raw records

pub mod csv_dir;
pub mod in_memory;
pub mod loader;
pub mod workbook;

use crate::constants::WORKBOOK_EXTENSIONS;
use crate::error::{ReportError, Result};
use crate::types::Cell;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

pub use csv_dir::CsvDirectorySource;
pub use in_memory::InMemorySource;
pub use loader::{LoadedData, Loader};
pub use workbook::WorkbookSource;

/// One named sheet: a header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Index of a required column, or `SchemaMismatch` naming the sheet.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| {
            ReportError::SchemaMismatch(format!(
                "sheet '{}' has no '{}' column (found: {})",
                self.name,
                column,
                self.headers.join(", ")
            ))
        })
    }

    /// Cell at (row, column). Ragged rows read as empty past their end.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }
}

/// Read side of the pipeline: anything that can hand out named sheets
pub trait TabularSource {
    /// Human-readable description of where the data comes from
    fn describe(&self) -> String;

    /// Names of the sheets this source exposes
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet; `SourceUnavailable` if it does not exist
    fn read_sheet(&mut self, name: &str) -> Result<RawTable>;
}

/// Open the source behind `path`: a workbook file or a directory of `<sheet>.csv` files.
pub fn open_source(path: &Path) -> Result<Box<dyn TabularSource>> {
    if !path.exists() {
        return Err(ReportError::SourceUnavailable(format!(
            "input path '{}' does not exist",
            path.display()
        )));
    }

    if path.is_dir() {
        debug!("Opening CSV directory source at {}", path.display());
        return Ok(Box::new(CsvDirectorySource::open(path)?));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        debug!("Opening workbook source at {}", path.display());
        Ok(Box::new(WorkbookSource::open(path)?))
    } else {
        Err(ReportError::SourceUnavailable(format!(
            "unsupported input '{}': expected a workbook ({}) or a directory of CSV files",
            path.display(),
            WORKBOOK_EXTENSIONS.join(", ")
        )))
    }
}
