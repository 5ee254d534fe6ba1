use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Malformed date in column '{column}' at row {row}: {value:?}")]
    MalformedDate {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Workbook read failed: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
