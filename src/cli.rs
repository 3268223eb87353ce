//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use osz_core::DEFAULT_CONCURRENCY;

/// Batch download beatmap-set archives from mirror hosts.
///
/// Reads a list of beatmap-set IDs (one per line), downloads each `.osz`
/// from the primary mirror with retries, and falls back to the next mirror
/// for anything that failed.
#[derive(Parser, Debug)]
#[command(name = "osz-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Identifier list file, one beatmap-set ID per line
    #[arg(default_value = "result.txt")]
    pub input: PathBuf,

    /// Directory to write downloaded archives to
    #[arg(short = 'o', long, default_value = "downloaded")]
    pub output_dir: PathBuf,

    /// Maximum concurrent downloads per stage (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output and progress bars
    #[arg(short, long)]
    pub quiet: bool,
}
