use crate::config::Config;
use crate::error::Result;
use crate::pipeline::ingestion::{open_source, LoadedData, Loader, TabularSource};
use crate::pipeline::manifest::{fingerprint_input, RunManifest};
use crate::pipeline::processing::{
    executive_rollup, region_totals, CleanReport, EnrichedDataset, ExecutiveRow, OrderCleaner,
    OrderEnricher, RegionTotals,
};
use crate::pipeline::report::{executive_table, operational_table, ReportTable};
use chrono::Utc;
use metrics::{counter, histogram};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span, instrument};
use uuid::Uuid;

/// Row caps applied by the reporter
#[derive(Debug, Clone, Copy)]
pub struct ReportLimits {
    pub operational_rows: usize,
    pub executive_rows: usize,
}

impl From<&Config> for ReportLimits {
    fn from(config: &Config) -> Self {
        Self {
            operational_rows: config.report.operational_rows,
            executive_rows: config.report.executive_rows,
        }
    }
}

/// Everything the transformation stages produce from one load
#[derive(Debug, Clone)]
pub struct Reports {
    pub clean_report: CleanReport,
    pub dataset: EnrichedDataset,
    pub executive_rows: Vec<ExecutiveRow>,
    pub region_totals: Vec<RegionTotals>,
    pub operational: ReportTable,
    pub executive: ReportTable,
}

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub reports: Reports,
    pub operational_file: PathBuf,
    pub executive_file: PathBuf,
    pub manifest_file: Option<PathBuf>,
}

pub struct ReportPipeline;

impl ReportPipeline {
    /// Clean, enrich, aggregate and project. Touches no files.
    pub fn build_reports(loaded: &LoadedData, limits: ReportLimits) -> Result<Reports> {
        let cleaned = {
            let _span = info_span!("clean").entered();
            let t = Instant::now();
            let cleaned = OrderCleaner::new().clean(&loaded.orders)?;
            histogram!("sales_reports_stage_duration_seconds", "stage" => "clean")
                .record(t.elapsed().as_secs_f64());
            cleaned
        };

        let dataset = {
            let _span = info_span!("enrich").entered();
            let t = Instant::now();
            let dataset = OrderEnricher::new(&loaded.returns).enrich(&cleaned.records)?;
            histogram!("sales_reports_stage_duration_seconds", "stage" => "enrich")
                .record(t.elapsed().as_secs_f64());
            dataset
        };

        let (executive_rows, region_totals) = {
            let _span = info_span!("aggregate").entered();
            (executive_rollup(&dataset), region_totals(&dataset.rows))
        };
        counter!("sales_reports_executive_groups_total").increment(executive_rows.len() as u64);

        let operational = operational_table(&dataset, limits.operational_rows);
        let executive = executive_table(&executive_rows, limits.executive_rows);

        Ok(Reports {
            clean_report: cleaned.report,
            dataset,
            executive_rows,
            region_totals,
            operational,
            executive,
        })
    }

    /// Run the complete pipeline against the configured input path.
    pub fn run(config: &Config) -> Result<PipelineResult> {
        let mut source = open_source(&config.input.path)?;
        Self::run_with_source(config, source.as_mut())
    }

    /// Run the complete pipeline against an already opened source.
    #[instrument(skip(config, source), fields(source = %source.describe()))]
    pub fn run_with_source(
        config: &Config,
        source: &mut dyn TabularSource,
    ) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let t_pipeline = Instant::now();
        info!("🚀 Starting report run {}", run_id);
        counter!("sales_reports_runs_total").increment(1);

        let loader = Loader::new(&config.input.orders_sheet, &config.input.returns_sheet);
        let loaded = loader.load(source)?;

        let reports = Self::build_reports(&loaded, ReportLimits::from(config))?;

        let writer = config.output.format.writer();
        let operational_file = config.operational_path();
        let executive_file = config.executive_path();
        writer.write(&reports.operational, &operational_file)?;
        info!("💾 Saved {} to {}", reports.operational.name, operational_file.display());
        writer.write(&reports.executive, &executive_file)?;
        info!("💾 Saved {} to {}", reports.executive.name, executive_file.display());

        let manifest_file = if config.output.write_manifest {
            let manifest = RunManifest {
                run_id,
                started_at,
                finished_at: Utc::now(),
                input: config.input.path.to_string_lossy().to_string(),
                input_files: fingerprint_input(&config.input.path)?,
                clean: reports.clean_report.clone(),
                scalars: reports.dataset.scalars,
                region_totals: reports.region_totals.clone(),
                executive_groups: reports.executive_rows.len(),
                outputs: vec![
                    operational_file.to_string_lossy().to_string(),
                    executive_file.to_string_lossy().to_string(),
                ],
            };
            let path = manifest.write_to(&config.manifest_path())?;
            info!("🧾 Wrote run manifest to {}", path.display());
            Some(path)
        } else {
            None
        };

        histogram!("sales_reports_pipeline_duration_seconds")
            .record(t_pipeline.elapsed().as_secs_f64());
        info!("✅ Report run {} finished in {:.2?}", run_id, t_pipeline.elapsed());

        Ok(PipelineResult {
            run_id,
            reports,
            operational_file,
            executive_file,
            manifest_file,
        })
    }
}
