//! CLI entry point for the osz downloader.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use osz_core::{ConsoleProgress, NoProgress, Pipeline, PipelineError, ProgressReporter};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

/// Exit code for a run aborted by the cancellation signal.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("osz downloader starting");

    let ids = osz_core::read_id_file(&args.input)
        .await
        .with_context(|| format!("failed to read identifier list {}", args.input.display()))?;

    if ids.is_empty() {
        info!(input = %args.input.display(), "No identifiers to process");
        return Ok(ExitCode::SUCCESS);
    }
    info!(ids = ids.len(), "Total unique IDs to process");

    let hosts = osz_core::default_mirrors()?;

    let progress: Arc<dyn ProgressReporter> = if args.quiet || !io::stderr().is_terminal() {
        Arc::new(NoProgress)
    } else {
        Arc::new(ConsoleProgress::new())
    };

    let pipeline = Pipeline::new(hosts, &args.output_dir, usize::from(args.concurrency))?
        .with_progress(progress);

    let shutdown = pipeline.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping new downloads");
            shutdown.trigger();
        }
    });

    match pipeline.run(ids).await {
        Ok(report) => {
            println!("Total files downloaded: {}", report.downloaded.len());
            println!("Total IDs failed after all attempts: {}", report.failed.len());
            println!("Failed IDs: {}", report.failed.join(" "));
            Ok(ExitCode::SUCCESS)
        }
        Err(PipelineError::Cancelled { stage, unfinished }) => {
            warn!(stage, unfinished = unfinished.len(), "Run cancelled");
            println!("Cancelled during stage {stage}.");
            println!("Unfinished IDs: {}", unfinished.join(" "));
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(e) => Err(e.into()),
    }
}
