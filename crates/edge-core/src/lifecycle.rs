//! Request lifecycle tracking.

use std::time::{Duration, Instant};

/// Lifecycle phases for a request moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, processing started.
    Start,
    /// A stage declined the request and handed it on unchanged.
    PassedThrough(String),
    /// A stage rewrote the request target.
    Rewritten {
        /// Stage that issued the rewrite.
        stage: String,
        /// New path and query.
        target: String,
    },
    /// A stage produced the response.
    Responded(String),
    /// Request completed.
    Completion,
}

/// When the request arrived. Rewrites keep the original start.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
}

impl TimingContext {
    /// Start timing now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a lifecycle phase occurs.
    fn on_phase(&self, phase: LifecyclePhase, elapsed: Duration);
}
