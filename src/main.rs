use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use xrayflow_config::PipelineDef;
use xrayflow_executor::report;
use xrayflow_pipeline::{Pipeline, load_definition};

/// xrayflow - runs test-report pipelines as a dependency graph of commands
#[derive(Parser)]
#[command(name = "xrayflow")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run every step of a pipeline and print a summary
  Run {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// Exit with an error if any step failed or was skipped
    #[arg(long)]
    strict: bool,
  },

  /// Check a pipeline and print the order its steps would run in
  Validate {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// Only list the steps that read from this step, directly or not
    #[arg(long)]
    from: Option<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // Logs go to stderr so stdout stays parseable.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  match cli.command {
    Some(Commands::Run {
      pipeline_file,
      strict,
    }) => run_pipeline(pipeline_file, strict)?,
    Some(Commands::Validate {
      pipeline_file,
      from,
    }) => validate_pipeline(pipeline_file, from)?,
    None => {
      println!("xrayflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn load(pipeline_file: &Path) -> Result<PipelineDef> {
  load_definition(pipeline_file)
    .with_context(|| format!("failed to load pipeline: {}", pipeline_file.display()))
}

fn run_pipeline(pipeline_file: PathBuf, strict: bool) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_pipeline_async(pipeline_file, strict).await })
}

async fn run_pipeline_async(pipeline_file: PathBuf, strict: bool) -> Result<()> {
  let def = load(&pipeline_file)?;
  let pipeline = Pipeline::build(&def).context("failed to build pipeline")?;

  eprintln!(
    "Loaded pipeline: {} ({} steps)",
    pipeline.name(),
    pipeline.graph().len()
  );

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let result = tokio::select! {
    result = pipeline.run() => result,
    _ = cancel.cancelled() => bail!("pipeline '{}' interrupted", pipeline.name()),
  };

  report::log_outcomes(&result);
  println!("{}", serde_json::to_string_pretty(&result.summary())?);

  if strict && !result.is_success() {
    bail!(
      "pipeline '{}' finished with {} failed and {} skipped steps",
      pipeline.name(),
      result.failed().count(),
      result.skipped().count()
    );
  }

  Ok(())
}

fn validate_pipeline(pipeline_file: PathBuf, from: Option<String>) -> Result<()> {
  let def = load(&pipeline_file)?;
  let pipeline = Pipeline::build(&def).context("invalid pipeline")?;

  if let Some(step_id) = from {
    let downstream = pipeline
      .downstream(&step_id)
      .with_context(|| format!("step '{step_id}' not found"))?;
    for step in downstream {
      println!("{step}");
    }
    return Ok(());
  }

  for (position, step_id) in pipeline.execution_order()?.iter().enumerate() {
    println!("{:>3}. {step_id}", position + 1);
  }
  eprintln!("Entry steps: {}", pipeline.entry_steps().join(", "));
  eprintln!("Final steps: {}", pipeline.final_steps().join(", "));

  Ok(())
}
