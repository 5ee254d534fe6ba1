// Report pipeline: ingestion, processing, reporting and output

pub mod ingestion;
pub mod manifest;
pub mod output;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod processing;
pub mod report;

pub use pipeline::{PipelineResult, ReportLimits, ReportPipeline, Reports};
