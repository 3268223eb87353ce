//! Core library for the osz downloader.
//!
//! Turns a list of beatmap-set identifiers into downloaded `.osz` archives
//! fetched from an ordered chain of mirror hosts, with bounded concurrency,
//! per-identifier retry, host fallback, and cooperative cancellation.
//!
//! # Architecture
//!
//! - [`input`] - identifier list parsing and dedup
//! - [`host`] - mirror host descriptors and URL templates
//! - [`download`] - fetcher, retry driver, stage coordinator, pipeline
//! - [`progress`] - injected progress reporting seam
//! - [`shutdown`] - shared cooperative cancellation signal

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod host;
pub mod input;
pub mod progress;
pub mod shutdown;

// Re-export commonly used types
pub use download::{
    ARCHIVE_EXTENSION, DEFAULT_CONCURRENCY, FetchError, HttpClient, Pipeline, PipelineError,
    PipelineReport, StageError, StageResult, ensure_archive_extension,
};
pub use host::{ConfigError, HostDescriptor, ID_PLACEHOLDER, default_mirrors};
pub use input::{parse_id_list, read_id_file};
pub use progress::{AttemptDisplay, AttemptProgress, ConsoleProgress, NoProgress, ProgressReporter};
pub use shutdown::Shutdown;
