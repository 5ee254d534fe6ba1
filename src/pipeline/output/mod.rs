// Report sinks: the write side of the pipeline

pub mod csv_out;
pub mod json_out;

use crate::error::Result;
use crate::pipeline::report::ReportTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use csv_out::CsvReportWriter;
pub use json_out::JsonReportWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    pub fn writer(&self) -> Box<dyn ReportWriter> {
        match self {
            OutputFormat::Csv => Box::new(CsvReportWriter),
            OutputFormat::Json => Box::new(JsonReportWriter),
        }
    }
}

/// Persists a report table at a path, creating parent directories as needed
pub trait ReportWriter {
    fn write(&self, table: &ReportTable, path: &Path) -> Result<()>;
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
