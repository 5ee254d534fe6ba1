use super::{ensure_parent, ReportWriter};
use crate::error::Result;
use crate::pipeline::report::ReportTable;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes the table as pretty JSON: `{ "name", "columns", "rows": [[...], ...] }`
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn write(&self, table: &ReportTable, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let json_content = serde_json::to_string_pretty(table)?;
        fs::write(path, json_content)?;
        debug!("Wrote {} rows of '{}' to {}", table.len(), table.name, path.display());
        Ok(())
    }
}
