//! Operational and executive sales reports from an orders/returns workbook.
//!
//! Data flows one way: ingestion (load) -> processing (clean, enrich,
//! aggregate) -> report projection -> output writers.

pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

pub use config::Config;
pub use error::{ReportError, Result};
pub use pipeline::{PipelineResult, ReportPipeline};
