//! pathcheck: symbolic path reachability analysis over a source file.
//!
//! Reads a program, analyzes every control-flow path, and prints the JSON
//! result document: a list of line-annotated reachability notes on
//! success, an `{error}` envelope on failure.

use anyhow::{Context, Result};
use clap::Parser;
use pathcheck::{analyze, AnalysisConfig, AnalyzeRequest};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pathcheck")]
#[command(about = "Symbolic path reachability analysis")]
#[command(version)]
struct Cli {
    /// Source file to analyze, or `-` for stdin
    input: PathBuf,

    /// Include non-fatal warnings in the output document
    #[arg(long)]
    warnings: bool,

    /// Include the per-stage trace in the output document
    #[arg(long)]
    logging: bool,

    /// Also report reachable conditional paths
    #[arg(long)]
    include_reachable: bool,

    /// Overall analysis timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    analysis_timeout_ms: u64,

    /// Per-path solver timeout in milliseconds
    #[arg(long, default_value_t = 2_000)]
    path_solver_timeout_ms: u64,

    /// Enable verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pathcheck=debug,info"
    } else {
        "pathcheck=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let source_text = if cli.input.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&cli.input)
            .with_context(|| format!("reading {}", cli.input.display()))?
    };

    let request = AnalyzeRequest {
        source_text,
        config: AnalysisConfig {
            warnings: cli.warnings,
            logging: cli.logging,
            include_reachable: cli.include_reachable,
            analysis_timeout_ms: cli.analysis_timeout_ms,
            path_solver_timeout_ms: cli.path_solver_timeout_ms,
        },
    };

    match analyze(&request) {
        Ok(report) => {
            println!("{}", report.to_json());
            Ok(())
        }
        Err(err) => {
            println!(
                "{}",
                serde_json::to_string(&err.envelope()).unwrap_or_default()
            );
            std::process::exit(if err.is_client_error() { 1 } else { 2 });
        }
    }
}
