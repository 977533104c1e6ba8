mod collect;
mod config;
mod hooks;
mod method;
mod record;
mod report;
mod runner;
mod summary;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Benchmark browser-automation methods against a fixed task: run the
/// agent once per method and run index, capture its stream-JSON output,
/// then aggregate duration/cost/turn telemetry into a markdown
/// comparison report.
#[derive(Parser, Debug)]
#[command(name = "browser-bench", version, about)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "bench.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute the configured benchmark runs
    Run {
        /// Override runs per method (default: from config)
        #[arg(long)]
        runs: Option<u32>,

        /// Override the results directory
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Aggregate results and write the comparison report
    Report {
        /// Override the results directory
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Override the report output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Top-level error: wraps the per-phase errors so `main` can report the
/// full diagnostic chain from one place.
#[derive(Debug)]
enum AppError {
    Config(config::ConfigError),
    Collect(collect::CollectError),
    Runner(runner::RunnerError),
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{e}"),
            AppError::Collect(e) => write!(f, "{e}"),
            AppError::Runner(e) => write!(f, "{e}"),
            AppError::CreateDir { path, source } => {
                write!(f, "failed to create {}: {}", path.display(), source)
            }
            AppError::WriteReport { path, source } => {
                write!(f, "failed to write report {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Collect(e) => Some(e),
            AppError::Runner(e) => Some(e),
            AppError::CreateDir { source, .. } => Some(source),
            AppError::WriteReport { source, .. } => Some(source),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<collect::CollectError> for AppError {
    fn from(e: collect::CollectError) -> Self {
        AppError::Collect(e)
    }
}

impl From<runner::RunnerError> for AppError {
    fn from(e: runner::RunnerError) -> Self {
        AppError::Runner(e)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Run { runs, results_dir } => {
            if let Some(runs) = runs {
                config.bench.runs = runs;
            }
            if let Some(dir) = results_dir {
                config.bench.results_dir = dir;
            }
            let outcomes = runner::run_all(&config).await?;
            for o in &outcomes {
                println!(
                    "  {} / {} run {}: exit {} in {}s -> {}",
                    o.evaluation,
                    o.method.key(),
                    o.run_index,
                    o.exit_code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    o.duration.as_secs(),
                    o.output_file.display()
                );
            }
            println!(
                "Completed {} runs. Results in {}",
                outcomes.len(),
                config.bench.results_dir.display()
            );
            Ok(())
        }
        Commands::Report {
            results_dir,
            output,
        } => {
            if let Some(dir) = results_dir {
                config.bench.results_dir = dir;
            }
            if let Some(path) = output {
                config.bench.report_file = path;
            }
            handle_report(&config)
        }
    }
}

/// Collect, aggregate, render, write. Collection errors (missing
/// directory, no result files, malformed telemetry) surface before
/// anything is written, so a failed invocation never leaves a report
/// behind.
fn handle_report(config: &config::BenchConfig) -> Result<(), AppError> {
    let grouped = collect::collect_results(&config.bench.results_dir)?;
    let evals = summary::summarize(grouped);
    let text = report::render(&evals);

    if let Some(parent) = config.bench.report_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    std::fs::write(&config.bench.report_file, &text).map_err(|e| AppError::WriteReport {
        path: config.bench.report_file.clone(),
        source: e,
    })?;

    print!("{text}");
    tracing::info!(report = %config.bench.report_file.display(), "report written");
    Ok(())
}
