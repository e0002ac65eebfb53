//! Live progress reporting
//!
//! While a run is in progress the coordinator samples every worker's
//! counters at a fixed interval and prints one line:
//!
//! ```text
//! sec 3, send request count: 1,204, done: 1,198
//! ```
//!
//! The `sec` figure is the number of ticks times the interval, so it always
//! advances in whole intervals regardless of scheduling jitter.
//!
//! Reading the counters never takes a lock, so progress lines cannot slow the
//! workers down.

use crate::output::text::format_number;
use crate::stats::WorkerCounters;
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time sum of all worker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub sent: u64,
    pub done: u64,
}

impl ProgressSnapshot {
    /// Sum the counters of every worker
    pub fn collect(counters: &[Arc<WorkerCounters>]) -> Self {
        counters.iter().fold(Self::default(), |acc, c| Self {
            sent: acc.sent + c.sent.get(),
            done: acc.done + c.done.get(),
        })
    }
}

/// Periodic progress line printer
#[derive(Debug)]
pub struct ProgressReporter {
    counters: Vec<Arc<WorkerCounters>>,
    interval: Duration,
    ticks: u64,
}

impl ProgressReporter {
    pub fn new(counters: Vec<Arc<WorkerCounters>>, interval: Duration) -> Self {
        Self {
            counters,
            interval,
            ticks: 0,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::collect(&self.counters)
    }

    /// Seconds covered by the ticks so far
    pub fn seconds(&self) -> u64 {
        self.ticks.saturating_mul(self.interval.as_secs())
    }

    /// Advance one interval and return the progress line for it
    pub fn tick(&mut self) -> String {
        self.ticks += 1;
        format_progress(self.seconds(), self.snapshot())
    }

    /// Advance one interval and print its progress line to stdout
    pub fn display_console(&mut self) {
        println!("{}", self.tick());
    }
}

/// Format one progress line
pub fn format_progress(seconds: u64, snapshot: ProgressSnapshot) -> String {
    format!(
        "sec {}, send request count: {}, done: {}",
        seconds,
        format_number(snapshot.sent),
        format_number(snapshot.done)
    )
}
