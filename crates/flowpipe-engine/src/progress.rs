//! Progress reporting.
//!
//! The reachability loop is long-running; callers can observe it through a
//! write-only sink. Sinks are infallible by construction, so a misbehaving
//! observer cannot affect results.

use tracing::info;

/// Write-only observer of the reachability loop.
pub trait ProgressSink {
    /// Called once before the loop with the total step count, the minimum
    /// number of steps between updates the sink cares about, and a label.
    fn start(&mut self, total: usize, min_interval: usize, label: &str);

    /// Called with the current step index as the loop advances.
    fn update(&mut self, step: usize);
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: usize, _min_interval: usize, _label: &str) {}

    fn update(&mut self, _step: usize) {}
}

/// Sink that reports through `tracing` at the requested interval.
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: usize,
    min_interval: usize,
    label: String,
    last_reported: usize,
}

impl ProgressSink for TracingProgress {
    fn start(&mut self, total: usize, min_interval: usize, label: &str) {
        self.total = total;
        self.min_interval = min_interval.max(1);
        self.label = label.to_string();
        self.last_reported = 0;
        info!(total, label, "starting");
    }

    fn update(&mut self, step: usize) {
        if step >= self.last_reported + self.min_interval || step == self.total {
            self.last_reported = step;
            info!(step, total = self.total, label = %self.label, "progress");
        }
    }
}
