use super::{RawTable, TabularSource};
use crate::error::{ReportError, Result};
use crate::types::Cell;
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory holding one `<sheet>.csv` file per sheet, e.g. `Orders.csv` and `Returns.csv`
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ReportError::SourceUnavailable(format!(
                "'{}' is not a directory",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl TabularSource for CsvDirectorySource {
    fn describe(&self) -> String {
        format!("CSV directory {}", self.dir.display())
    }

    fn sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| {
                        p.extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
                    })
                    .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawTable> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(ReportError::SourceUnavailable(format!(
                "sheet '{}' not found: {} does not exist",
                name,
                path.display()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(&path)?;

        // Byte records so a stray non-UTF-8 byte (Windows-1252 exports) costs one
        // character instead of the whole sheet.
        let mut lossy_fields = 0usize;
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| decode_field(h, &mut lossy_fields).trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let mut cells = Vec::with_capacity(record.len());
            for field in record.iter() {
                cells.push(Cell::from_text(&decode_field(field, &mut lossy_fields)));
            }
            rows.push(cells);
        }

        if lossy_fields > 0 {
            warn!(
                "{} fields in {} were not valid UTF-8; invalid bytes replaced",
                lossy_fields,
                path.display()
            );
        }
        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(RawTable::new(name, headers, rows))
    }
}

fn decode_field<'a>(bytes: &'a [u8], lossy_fields: &mut usize) -> Cow<'a, str> {
    let text = String::from_utf8_lossy(bytes);
    if matches!(text, Cow::Owned(_)) {
        *lossy_fields += 1;
    }
    text
}
