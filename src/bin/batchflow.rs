//! # Batchflow CLI
//!
//! Runs the batch scheduler over a JSON / JSON Lines file with one of the
//! built-in processors, prints a dry-run dispatch plan, or validates configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

use batchflow_core::batching::{
    ApproxTokenEstimator, CharCountEstimator, CostEstimator, WhitespaceTokenEstimator,
};
use batchflow_core::config::{BatchflowConfig, ConfigManager, ConfigOverrides, FailurePolicy};
use batchflow_core::execution::{BatchPipeline, BuiltinProcessorFactory, ProcessorKind};
use batchflow_core::io::{load_records, write_json, write_records, OutputFormat};
use batchflow_core::logging::init_structured_logging;
use batchflow_core::BatchflowError;

#[derive(Parser)]
#[command(name = "batchflow")]
#[command(about = "Token-budgeted batch scheduler for text processors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an input file and write results in input order
    Run {
        /// Input records (JSON array, or JSON Lines for .jsonl)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (JSON Lines for .jsonl, pretty JSON otherwise)
        #[arg(short, long)]
        output: PathBuf,

        /// Optional path for the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        scheduling: SchedulingArgs,

        /// Built-in processor to run
        #[arg(long, value_enum, default_value_t = ProcessorArg::Identity)]
        processor: ProcessorArg,

        /// Keep going after batch failures and write partial output
        #[arg(long)]
        degraded: bool,
    },

    /// Show how an input file would be batched and distributed
    Plan {
        /// Input records (JSON array, or JSON Lines for .jsonl)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        scheduling: SchedulingArgs,
    },

    /// Load and validate configuration
    ValidateConfig {
        /// Configuration file (default: config/batchflow.toml plus environment overlay)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Settings shared by `run` and `plan`; flags override configuration
#[derive(clap::Args)]
struct SchedulingArgs {
    /// Configuration file (default: config/batchflow.toml plus environment overlay, when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cost budget per batch
    #[arg(long)]
    max_batch_cost: Option<usize>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Device identifier, repeatable (e.g. --device cuda:0 --device cuda:1)
    #[arg(long = "device")]
    devices: Vec<String>,

    /// Text fields to process, comma separated, in processing order
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Cost function for batching
    #[arg(long, value_enum, default_value_t = EstimatorArg::ApproxTokens)]
    estimator: EstimatorArg,
}

impl SchedulingArgs {
    fn overrides(&self) -> ConfigOverrides {
        let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        ConfigOverrides {
            max_batch_cost: self.max_batch_cost,
            worker_count: self.workers,
            device_ids: non_empty(&self.devices),
            fields: non_empty(&self.fields),
            failure_policy: None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProcessorArg {
    Identity,
    Uppercase,
}

impl From<ProcessorArg> for ProcessorKind {
    fn from(arg: ProcessorArg) -> Self {
        match arg {
            ProcessorArg::Identity => ProcessorKind::Identity,
            ProcessorArg::Uppercase => ProcessorKind::Uppercase,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EstimatorArg {
    Chars,
    Words,
    ApproxTokens,
}

impl EstimatorArg {
    fn build(self) -> Arc<dyn CostEstimator> {
        match self {
            EstimatorArg::Chars => Arc::new(CharCountEstimator),
            EstimatorArg::Words => Arc::new(WhitespaceTokenEstimator),
            EstimatorArg::ApproxTokens => Arc::new(ApproxTokenEstimator),
        }
    }
}

#[tokio::main]
async fn main() {
    init_structured_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            report,
            scheduling,
            processor,
            degraded,
        } => run(&input, &output, report.as_deref(), &scheduling, processor, degraded).await,
        Commands::Plan { input, scheduling } => plan(&input, &scheduling),
        Commands::ValidateConfig { config } => validate_config(config.as_deref()),
    };

    if let Err(e) = result {
        error!("batchflow failed: {:#}", e);
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(
    input: &Path,
    output: &Path,
    report_path: Option<&Path>,
    scheduling: &SchedulingArgs,
    processor: ProcessorArg,
    degraded: bool,
) -> Result<()> {
    let config = resolve_config(scheduling, degraded)?;

    let pipeline = BatchPipeline::new(
        config,
        scheduling.estimator.build(),
        Arc::new(BuiltinProcessorFactory::new(processor.into())),
    )?;

    let records = load_records(input)
        .with_context(|| format!("failed to read input {}", input.display()))?;

    let pipeline_output = match pipeline.run_records(records).await {
        Ok(out) => out,
        Err(BatchflowError::RunFailed { run_id, failures }) => {
            if let Some(path) = report_path {
                write_json(path, &failures)?;
            }
            for failure in &failures {
                warn!(
                    run_id = %run_id,
                    worker_id = failure.worker_id,
                    batch_index = failure.batch_index,
                    kind = %failure.kind,
                    "Batch failed: {}",
                    failure.message
                );
            }
            return Err(BatchflowError::RunFailed { run_id, failures }.into());
        }
        Err(e) => return Err(e.into()),
    };

    write_records(output, &pipeline_output.records, OutputFormat::from_path(output))
        .with_context(|| format!("failed to write output {}", output.display()))?;

    if let Some(path) = report_path {
        write_json(path, &pipeline_output.report)?;
    }

    let report = &pipeline_output.report;
    info!(
        run_id = %report.run_id,
        records = pipeline_output.records.len(),
        failed_batches = report.failures.len(),
        duration_ms = report.duration_ms,
        "Run finished"
    );
    println!(
        "Wrote {} of {} records to {} ({} batches, {} workers, {} ms)",
        pipeline_output.records.len(),
        report.total_items,
        output.display(),
        report.total_batches,
        report.worker_count,
        report.duration_ms
    );
    if !report.is_complete() {
        println!(
            "{} batch(es) failed; unprocessed sequence numbers: {:?}",
            report.failures.len(),
            report.unprocessed_sequence_nos()
        );
    }

    Ok(())
}

fn plan(input: &Path, scheduling: &SchedulingArgs) -> Result<()> {
    let config = resolve_config(scheduling, false)?;
    let pipeline = BatchPipeline::new(
        config,
        scheduling.estimator.build(),
        Arc::new(BuiltinProcessorFactory::default()),
    )?;

    let records = load_records(input)
        .with_context(|| format!("failed to read input {}", input.display()))?;
    let items = pipeline.ingest(records)?;
    let plan = pipeline.plan(items)?;

    println!("Items:          {}", plan.total_items);
    println!("Total cost:     {}", plan.total_cost);
    println!("Budget:         {}", plan.max_batch_cost);
    println!("Batches:        {}", plan.batches.len());
    println!(
        "Oversized:      {}",
        plan.batches.iter().filter(|b| b.oversized).count()
    );
    println!();
    for worker in &plan.workers {
        println!(
            "worker {} on {}: {} batches, {} items, cost {}",
            worker.worker_id,
            worker.device,
            worker.batch_indices.len(),
            worker.items,
            worker.total_cost
        );
    }
    println!();
    for batch in &plan.batches {
        println!(
            "batch {:>4} -> worker {}: {} items, cost {}{}",
            batch.index,
            batch.worker_id,
            batch.items,
            batch.cost,
            if batch.oversized { " (oversized)" } else { "" }
        );
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let manager = ConfigManager::load_with_overrides(path, &ConfigOverrides::default())?;
    let config = manager.config();

    println!("Configuration is valid");
    println!("Environment:    {}", manager.environment());
    for source in manager.sources() {
        println!("Source:         {}", source.display());
    }
    println!("Budget:         {}", config.batching.max_batch_cost);
    println!("Fields:         {}", config.batching.fields.join(", "));
    println!("Workers:        {}", config.workers.effective_worker_count());
    println!("Devices:        {:?}", config.workers.device_ids);
    println!("Failure policy: {}", config.workers.failure_policy);

    Ok(())
}

/// Files, `BATCHFLOW__*` variables, then flags; validated as one stack
fn resolve_config(scheduling: &SchedulingArgs, degraded: bool) -> Result<BatchflowConfig> {
    let mut overrides = scheduling.overrides();
    if degraded {
        overrides.failure_policy = Some(FailurePolicy::Degraded);
    }
    let manager = ConfigManager::load_with_overrides(scheduling.config.as_deref(), &overrides)?;
    Ok(manager.into_config())
}
