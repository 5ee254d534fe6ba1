use super::{ensure_parent, ReportWriter};
use crate::error::Result;
use crate::pipeline::report::ReportTable;
use csv::WriterBuilder;
use std::path::Path;
use tracing::debug;

/// Writes a header row followed by one CSV record per report row; empty values are blank fields
pub struct CsvReportWriter;

impl ReportWriter for CsvReportWriter {
    fn write(&self, table: &ReportTable, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        debug!("Wrote {} rows of '{}' to {}", table.len(), table.name, path.display());
        Ok(())
    }
}
