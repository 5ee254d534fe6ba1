use super::{RawTable, TabularSource};
use crate::error::{ReportError, Result};
use std::collections::BTreeMap;

/// In-memory source for tests and for callers that already hold the tables
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    sheets: BTreeMap<String, RawTable>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, table: RawTable) -> Self {
        self.sheets.insert(table.name.clone(), table);
        self
    }
}

impl TabularSource for InMemorySource {
    fn describe(&self) -> String {
        "in-memory tables".to_string()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawTable> {
        self.sheets
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::SourceUnavailable(format!("no sheet named '{name}'")))
    }
}
