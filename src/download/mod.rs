//! Multi-stage concurrent download engine.
//!
//! Layered leaves-first:
//! - [`client`] performs one streaming HTTP attempt,
//! - [`retry`] loops attempts for one identifier against one host,
//! - [`stage`] fans identifiers out over a bounded worker pool,
//! - [`pipeline`] chains stages across the mirror fallback list.

mod client;
mod error;
mod filename;
mod pipeline;
mod retry;
mod stage;

pub use client::HttpClient;
pub use error::FetchError;
pub use filename::{ARCHIVE_EXTENSION, ensure_archive_extension};
pub use pipeline::{DEFAULT_CONCURRENCY, Pipeline, PipelineError, PipelineReport};
pub use stage::{StageError, StageResult};
