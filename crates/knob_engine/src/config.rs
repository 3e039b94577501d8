//! Configuration for the reconciler.

use std::time::Duration;

/// Configuration for a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Delay between polls of an in-flight remote operation.
    pub poll_interval: Duration,
}

impl ReconcilerConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Sets the delay between operation polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}
