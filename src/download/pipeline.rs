//! Pipeline orchestrator: chains stage passes over a mirror host list.
//!
//! Stage *i* only processes identifiers that exhausted stage *i-1*; the
//! first stage runs over the full deduplicated input. A failed identifier
//! is data flowing into the next stage, never an error crossing a stage
//! boundary.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::client::HttpClient;
use super::stage::{self, StageError, StageResult};
use crate::host::HostDescriptor;
use crate::progress::{NoProgress, ProgressReporter};
use crate::shutdown::Shutdown;

/// Minimum allowed pool width.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed pool width.
const MAX_CONCURRENCY: usize = 100;

/// Default pool width per stage.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Errors terminating a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pool width supplied at construction.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The output directory could not be created at construction.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The shutdown signal fired mid-run. No [`PipelineReport`] is
    /// produced; callers report the unfinished set and exit non-zero.
    #[error("pipeline cancelled during stage {stage} with {} identifiers unfinished", unfinished.len())]
    Cancelled {
        /// 1-based stage number that was interrupted.
        stage: usize,
        /// Identifiers of that stage with no terminal outcome.
        unfinished: Vec<String>,
    },
}

/// Final aggregated result of a completed pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Union of identifiers downloaded across all stages.
    pub downloaded: HashSet<String>,
    /// Identifiers that failed every stage (last stage's failure list).
    pub failed: Vec<String>,
}

/// Multi-stage concurrent downloader over an ordered mirror chain.
pub struct Pipeline {
    client: HttpClient,
    hosts: Vec<HostDescriptor>,
    output_dir: PathBuf,
    concurrency: usize,
    progress: Arc<dyn ProgressReporter>,
    shutdown: Arc<Shutdown>,
}

impl Pipeline {
    /// Creates a pipeline, validating the pool width and creating the
    /// output directory once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConcurrency`] for a pool width
    /// outside 1-100, or [`PipelineError::OutputDir`] when the output
    /// directory cannot be created.
    pub fn new(
        hosts: Vec<HostDescriptor>,
        output_dir: impl Into<PathBuf>,
        concurrency: usize,
    ) -> Result<Self, PipelineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(PipelineError::InvalidConcurrency { value: concurrency });
        }

        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        debug!(
            stages = hosts.len(),
            concurrency,
            output_dir = %output_dir.display(),
            "creating download pipeline"
        );

        Ok(Self {
            client: HttpClient::new(),
            hosts,
            output_dir,
            concurrency,
            progress: Arc::new(NoProgress),
            shutdown: Arc::new(Shutdown::new()),
        })
    }

    /// Replaces the progress reporter (defaults to [`NoProgress`]).
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Shared cancellation signal; trigger it to abort the whole run.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        Arc::clone(&self.shutdown)
    }

    /// Configured pool width.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Directory downloads are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs every stage in order and aggregates the final report.
    ///
    /// The input is deduplicated preserving first-seen order before the
    /// first stage. Stages stop early once no identifiers remain.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Cancelled`] when the shutdown signal fires
    /// during any stage; no report is produced in that case.
    pub async fn run(&self, ids: Vec<String>) -> Result<PipelineReport, PipelineError> {
        let mut pending = dedup_first_seen(ids);
        let mut report = PipelineReport::default();

        info!(ids = pending.len(), "starting download pipeline");

        for (stage_idx, host) in self.hosts.iter().enumerate() {
            if pending.is_empty() {
                break;
            }
            let stage_no = stage_idx + 1;

            info!(
                stage = stage_no,
                host = host.label(),
                ids = pending.len(),
                attempts = host.max_attempts(),
                "starting stage"
            );

            let StageResult { downloaded, failed } = stage::run_stage(
                &self.client,
                &pending,
                host,
                &self.output_dir,
                self.concurrency,
                &self.progress,
                &self.shutdown,
            )
            .await
            .map_err(|StageError::Cancelled { unfinished }| PipelineError::Cancelled {
                stage: stage_no,
                unfinished,
            })?;

            info!(
                stage = stage_no,
                host = host.label(),
                downloaded = downloaded.len(),
                failed = failed.len(),
                "stage complete"
            );

            report.downloaded.extend(downloaded);
            pending = failed;
        }

        report.failed = pending;

        info!(
            downloaded = report.downloaded.len(),
            failed = report.failed.len(),
            "pipeline complete"
        );

        Ok(report)
    }
}

fn dedup_first_seen(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
