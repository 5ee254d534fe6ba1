use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sales_reports::logging;
use sales_reports::observability;
use sales_reports::pipeline::ingestion::open_source;
use sales_reports::pipeline::output::OutputFormat;
use sales_reports::pipeline::report::render_preview;
use sales_reports::{Config, ReportPipeline};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sales_reports")]
#[command(about = "Operational and executive sales reports from an orders/returns workbook")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, clean, enrich and aggregate the input, then write both reports
    Run {
        /// Workbook file or directory holding Orders.csv and Returns.csv
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory the reports are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Report file format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Skip writing run_manifest.json and metrics.prom
        #[arg(long)]
        no_manifest: bool,
    },
    /// Show the sheets, headers and row counts the loader sees
    Inspect {
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::load(path.map(|p| p.as_path())).context("loading configuration")?;
    config.apply_env().context("applying environment overrides")?;
    Ok(config)
}

fn run(
    mut config: Config,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    no_manifest: bool,
) -> Result<()> {
    if let Some(input) = input {
        config.input.path = input;
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if let Some(format) = format {
        config.output.format = format;
    }
    if no_manifest {
        config.output.write_manifest = false;
    }

    println!("🚀 Building reports from {}", config.input.path.display());
    let result = ReportPipeline::run(&config)
        .with_context(|| format!("report run failed for {}", config.input.path.display()))?;

    let clean = &result.reports.clean_report;
    let scalars = &result.reports.dataset.scalars;
    println!("\n📊 Run {}:", result.run_id);
    println!("   Orders loaded: {}", clean.rows_in);
    println!("   Duplicates removed: {}", clean.duplicates_removed);
    println!(
        "   Sales filled: {}, quantities filled: {}",
        clean.sales_filled, clean.quantities_filled
    );
    println!("   Return rate: {:.2}%", scalars.return_rate_pct);
    println!("   Average order value: {:.2}", scalars.average_order_value);
    println!("   Region-month groups: {}", result.reports.executive_rows.len());

    let operational = &result.reports.operational;
    println!("\nOperational Table (First {} Rows):", operational.len());
    print!("{}", render_preview(operational, operational.len()));

    let executive = &result.reports.executive;
    println!("\nExecutive Report Table (First 10 Rows):");
    print!("{}", render_preview(executive, 10));

    println!("\n💾 {}", result.operational_file.display());
    println!("💾 {}", result.executive_file.display());
    if let Some(manifest) = &result.manifest_file {
        println!("🧾 {}", manifest.display());
    }

    if config.output.write_manifest {
        if let Some(handle) = observability::init_metrics() {
            let path = config.metrics_path();
            observability::write_snapshot(handle, &path)
                .with_context(|| format!("writing metrics to {}", path.display()))?;
            println!("📈 {}", path.display());
        }
    }
    Ok(())
}

fn inspect(config: Config, input: Option<PathBuf>) -> Result<()> {
    let path = input.unwrap_or(config.input.path);
    let mut source = open_source(&path).with_context(|| format!("opening {}", path.display()))?;
    println!("🔎 {}", source.describe());
    for name in source.sheet_names() {
        let table = source
            .read_sheet(&name)
            .with_context(|| format!("reading sheet '{}'", name))?;
        println!("\n   Sheet '{}': {} rows", name, table.rows.len());
        println!("   Columns: {}", table.headers.join(" | "));
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();
    observability::init_metrics();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let outcome = match cli.command {
        Commands::Run {
            input,
            output_dir,
            format,
            no_manifest,
        } => run(config, input, output_dir, format, no_manifest),
        Commands::Inspect { input } => inspect(config, input),
    };

    match &outcome {
        Ok(()) => info!("Done"),
        Err(e) => error!("❌ {:#}", e),
    }
    outcome
}
