//! Progress reporting seam for download attempts.
//!
//! The fetcher never prints; it emits events through an injected
//! [`ProgressReporter`] so callers can render bars, logs, or nothing.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Presentational context for one attempt within a stage batch.
///
/// Carried for display only; it never affects control flow.
#[derive(Debug, Clone, Copy)]
pub struct AttemptDisplay {
    /// 1-based position of the identifier within the batch.
    pub index: usize,
    /// Batch size.
    pub total: usize,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Attempt budget for the host.
    pub max_attempts: u32,
}

/// Factory for per-attempt progress handles, shared across workers.
pub trait ProgressReporter: Send + Sync {
    /// Called once per attempt after the response headers arrive, when the
    /// output filename and declared length (if any) are known.
    fn attempt_started(
        &self,
        display: AttemptDisplay,
        filename: &str,
        total_bytes: Option<u64>,
    ) -> Box<dyn AttemptProgress>;
}

/// Progress handle for a single in-flight attempt.
pub trait AttemptProgress: Send + Sync {
    /// Reports a chunk of `delta` bytes written to disk.
    fn bytes_received(&self, delta: u64);

    /// Tears the handle down; the attempt has ended (success or failure).
    fn finished(self: Box<Self>);
}

/// Reporter that renders nothing. Used in quiet mode, non-TTY runs, and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn attempt_started(
        &self,
        _display: AttemptDisplay,
        _filename: &str,
        _total_bytes: Option<u64>,
    ) -> Box<dyn AttemptProgress> {
        Box::new(NoAttempt)
    }
}

struct NoAttempt;

impl AttemptProgress for NoAttempt {
    fn bytes_received(&self, _delta: u64) {}

    fn finished(self: Box<Self>) {}
}

/// Terminal reporter: one transient bar per in-flight attempt.
#[derive(Clone, Default)]
pub struct ConsoleProgress {
    multi: MultiProgress,
}

impl ConsoleProgress {
    /// Creates a reporter drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn attempt_started(
        &self,
        display: AttemptDisplay,
        filename: &str,
        total_bytes: Option<u64>,
    ) -> Box<dyn AttemptProgress> {
        let bar = match total_bytes {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::with_template("{msg} {bytes}/{total_bytes} {bar:24}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            }
            None => {
                // No Content-Length: indeterminate, but bytes still advance.
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{msg} {bytes} {spinner}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        let bar = self.multi.add(bar);
        bar.set_message(format!(
            "{}/{} - attempt {}/{} - {}",
            display.index, display.total, display.attempt, display.max_attempts, filename
        ));
        Box::new(ConsoleAttempt { bar })
    }
}

struct ConsoleAttempt {
    bar: ProgressBar,
}

impl AttemptProgress for ConsoleAttempt {
    fn bytes_received(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn finished(self: Box<Self>) {
        self.bar.finish_and_clear();
    }
}
