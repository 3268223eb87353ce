//! Per-identifier retry loop against a single mirror host.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::client::HttpClient;
use super::error::FetchError;
use crate::host::HostDescriptor;
use crate::progress::{AttemptDisplay, ProgressReporter};
use crate::shutdown::Shutdown;

/// Terminal outcome of one identifier's attempt budget against one host.
#[derive(Debug)]
pub(crate) enum RetryOutcome {
    /// A single attempt succeeded; no further attempts were made.
    Success(PathBuf),
    /// Every attempt failed; carries the last error.
    Exhausted(FetchError),
    /// The shutdown signal fired before a terminal outcome.
    Cancelled,
}

/// Attempts to download one identifier from one host, retrying immediately
/// on failure up to the host's attempt budget.
///
/// Stops on the first success. `index`/`total` are presentational only.
/// The shutdown signal is checked between attempts and raced against the
/// in-flight request, so a triggered signal never starts new work.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn download_with_retry(
    client: &HttpClient,
    id: &str,
    host: &HostDescriptor,
    output_dir: &Path,
    index: usize,
    total: usize,
    progress: &dyn ProgressReporter,
    shutdown: &Shutdown,
) -> RetryOutcome {
    let url = host.resolve(id);
    let mut last_error: Option<FetchError> = None;

    for attempt in 1..=host.max_attempts() {
        if shutdown.is_triggered() {
            return RetryOutcome::Cancelled;
        }

        let display = AttemptDisplay {
            index,
            total,
            attempt,
            max_attempts: host.max_attempts(),
        };
        debug!(id, url = %url, attempt, "attempting download");

        let fetch = client.fetch_osz(&url, output_dir, host.timeout(), display, progress);
        let result = tokio::select! {
            result = fetch => result,
            () = shutdown.wait() => return RetryOutcome::Cancelled,
        };

        match result {
            Ok(path) => return RetryOutcome::Success(path),
            Err(error) => {
                // Immediate retry, no backoff: the mirrors fail fast and
                // transient errors clear on the next connection.
                warn!(id, url = %url, attempt, error = %error, "download attempt failed");
                last_error = Some(error);
            }
        }
    }

    warn!(
        id,
        host = host.label(),
        attempts = host.max_attempts(),
        "identifier failed after all attempts"
    );

    match last_error {
        Some(error) => RetryOutcome::Exhausted(error),
        // Unreachable: max_attempts >= 1 is enforced at configuration time.
        None => RetryOutcome::Exhausted(FetchError::invalid_url(url)),
    }
}
