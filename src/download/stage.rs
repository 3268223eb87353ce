//! Stage coordinator: one concurrent pass over a batch of identifiers
//! against a single mirror host.
//!
//! # Concurrency model
//!
//! - Each identifier runs in its own Tokio task gated by a semaphore of
//!   the configured pool width; permits release on task exit (RAII).
//! - Every worker sends exactly one completion message over an mpsc
//!   channel; the coordinator is the sole consumer, so no shared mutable
//!   accumulator exists.
//! - Completion order is whichever attempt finishes first; the failure
//!   list keeps that order.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, warn};

use super::client::HttpClient;
use super::retry::{self, RetryOutcome};
use crate::host::HostDescriptor;
use crate::progress::ProgressReporter;
use crate::shutdown::Shutdown;

/// Outcome of one full stage pass.
#[derive(Debug, Default)]
pub struct StageResult {
    /// Identifiers downloaded during this stage.
    pub downloaded: HashSet<String>,
    /// Identifiers that exhausted every attempt, in completion order.
    pub failed: Vec<String>,
}

/// Abnormal stage termination.
#[derive(Debug, Error)]
pub enum StageError {
    /// The shutdown signal fired during the stage. No partial
    /// [`StageResult`] escapes; the unfinished set is reported instead.
    #[error("stage cancelled with {} identifiers unfinished", unfinished.len())]
    Cancelled {
        /// Identifiers with no terminal outcome when the signal fired.
        unfinished: Vec<String>,
    },
}

/// Runs the retry driver over `ids` concurrently against one host.
///
/// Identifiers must already be unique. An empty batch is a no-op that
/// returns the empty result without touching the network.
///
/// # Errors
///
/// Returns [`StageError::Cancelled`] when the shutdown signal fires before
/// every identifier reaches a terminal outcome.
pub(crate) async fn run_stage(
    client: &HttpClient,
    ids: &[String],
    host: &HostDescriptor,
    output_dir: &Path,
    concurrency: usize,
    progress: &Arc<dyn ProgressReporter>,
    shutdown: &Arc<Shutdown>,
) -> Result<StageResult, StageError> {
    if ids.is_empty() {
        return Ok(StageResult::default());
    }

    let total = ids.len();
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, RetryOutcome)>();
    let mut handles = Vec::with_capacity(total);

    for (idx, id) in ids.iter().enumerate() {
        if shutdown.is_triggered() {
            break;
        }

        // Waiting for a permit is also a cancellation point: a triggered
        // signal must not queue more work behind a full pool.
        let permit = tokio::select! {
            permit = Arc::clone(&semaphore).acquire_owned() => {
                let Ok(permit) = permit else { break };
                permit
            }
            () = shutdown.wait() => break,
        };

        let tx = tx.clone();
        let client = client.clone();
        let host = host.clone();
        let id = id.clone();
        let output_dir = output_dir.to_path_buf();
        let progress = Arc::clone(progress);
        let shutdown = Arc::clone(shutdown);
        let index = idx + 1;

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            let outcome = retry::download_with_retry(
                &client,
                &id,
                &host,
                &output_dir,
                index,
                total,
                progress.as_ref(),
                &shutdown,
            )
            .await;
            // The receiver only closes after all workers finish, so a send
            // failure here is unreachable; ignore it rather than panic.
            let _ = tx.send((id, outcome));
        }));
    }
    drop(tx);

    let mut result = StageResult::default();
    let mut settled: HashSet<String> = HashSet::new();

    while let Some((id, outcome)) = rx.recv().await {
        match outcome {
            RetryOutcome::Success(path) => {
                debug!(id, path = %path.display(), "download completed");
                settled.insert(id.clone());
                result.downloaded.insert(id);
            }
            RetryOutcome::Exhausted(error) => {
                warn!(id, error = %error, "identifier exhausted all attempts");
                settled.insert(id.clone());
                result.failed.push(id);
            }
            RetryOutcome::Cancelled => {
                // Not settled: reported in the unfinished set below.
            }
        }
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "download task panicked");
        }
    }

    if shutdown.is_triggered() {
        let unfinished: Vec<String> = ids
            .iter()
            .filter(|id| !settled.contains(*id))
            .cloned()
            .collect();
        return Err(StageError::Cancelled { unfinished });
    }

    Ok(result)
}
