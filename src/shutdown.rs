//! Cooperative shutdown signal shared across pipeline workers.
//!
//! One [`Shutdown`] instance is shared by the Ctrl-C handler, the stage
//! submission loop, and every in-flight download attempt. Triggering it
//! stops new work from being scheduled and wakes any task awaiting
//! [`Shutdown::wait`].

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-shot cancellation signal. Once triggered it stays triggered.
#[derive(Debug, Default)]
pub struct Shutdown {
    triggered: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the signal and wakes all waiters.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Returns true once [`trigger`](Self::trigger) has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves when the signal is triggered; immediately if it already was.
    pub async fn wait(&self) {
        if self.is_triggered() {
            return;
        }
        let notified = self.notify.notified();
        // Re-check after registering: trigger() may have raced us between
        // the flag load and notified().
        if self.is_triggered() {
            return;
        }
        notified.await;
    }
}
