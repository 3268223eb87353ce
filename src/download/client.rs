//! HTTP client wrapper performing one streaming download attempt.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;
use url::Url;

use super::error::FetchError;
use super::filename::{ensure_archive_extension, filename_from_url, parse_content_disposition};
use crate::progress::{AttemptDisplay, ProgressReporter};

/// Connect timeout for all requests.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for streaming beatmap-set downloads.
///
/// Created once and reused across attempts for connection pooling. No
/// global read timeout is configured; the per-attempt deadline comes from
/// the host descriptor and is applied per request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new client with connect timeout and gzip decompression.
    ///
    /// # Panics
    ///
    /// Panics if the builder fails with the static configuration, which
    /// should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(concat!("osz-dl/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Performs one download attempt: GET `url`, stream the body into
    /// `output_dir`, report progress, and return the written path.
    ///
    /// The filename comes from the Content-Disposition header when present,
    /// else the last URL path segment, with `.osz` appended when missing.
    /// On failure a partially written file may remain on disk; the returned
    /// error is authoritative and callers must not treat the identifier as
    /// downloaded.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the URL is invalid, the request fails or
    /// times out, the server answers non-2xx, or writing to disk fails.
    pub async fn fetch_osz(
        &self,
        url: &str,
        output_dir: &Path,
        timeout: Option<Duration>,
        display: AttemptDisplay,
        progress: &dyn ProgressReporter,
    ) -> Result<PathBuf, FetchError> {
        let parsed_url = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if let Some(deadline) = timeout {
            request = request.timeout(deadline);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::http_status(url, response.status().as_u16()));
        }

        let filename = resolve_filename(&response, &parsed_url);
        let file_path = output_dir.join(&filename);
        let content_length = response.content_length();
        debug!(filename = %filename, path = %file_path.display(), "resolved output path");

        let handle = progress.attempt_started(display, &filename, content_length);

        let file = File::create(&file_path)
            .await
            .map_err(|e| FetchError::io(file_path.clone(), e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        let stream_result = async {
            while let Some(chunk_result) = stream.next().await {
                let chunk = chunk_result.map_err(|e| {
                    if e.is_timeout() {
                        FetchError::timeout(url)
                    } else {
                        FetchError::network(url, e)
                    }
                })?;
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(|e| FetchError::io(file_path.clone(), e))?;
                bytes_written += chunk.len() as u64;
                handle.bytes_received(chunk.len() as u64);
            }
            writer
                .flush()
                .await
                .map_err(|e| FetchError::io(file_path.clone(), e))
        }
        .await;

        handle.finished();

        // A failed transfer leaves the partial file in place; the error
        // return is what keeps the identifier out of the success set.
        stream_result?;

        debug!(path = %file_path.display(), bytes = bytes_written, "attempt complete");
        Ok(file_path)
    }
}

/// Resolves the output filename from the response and URL.
fn resolve_filename(response: &reqwest::Response, url: &Url) -> String {
    let base = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
        .map_or_else(
            || filename_from_url(url),
            |name| super::filename::sanitize_filename(&name),
        );
    ensure_archive_extension(&base)
}
