//! Statistics collection
//!
//! Per-range request statistics with lock-free live counters.
//!
//! This module provides the building blocks the aggregation pipeline is made of:
//!
//! - **Lock-free atomic counters**: per-worker sent/done progress without contention
//! - **Cache-line alignment**: Prevents false sharing between worker tasks
//! - **TimeStats**: sum/min/max/count of one duration series with `record` and `merge`
//! - **BucketStats**: counters and three timing series for one latency range
//!
//! # Example
//!
//! ```
//! use reqpulse::stats::TimeStats;
//! use std::time::Duration;
//!
//! let mut stats = TimeStats::new();
//! stats.record(Duration::from_millis(10));
//! stats.record(Duration::from_millis(30));
//!
//! assert_eq!(stats.min(), Some(Duration::from_millis(10)));
//! assert_eq!(stats.max(), Some(Duration::from_millis(30)));
//! assert_eq!(stats.mean(), Some(Duration::from_millis(20)));
//! ```

pub mod aggregator;
pub mod buckets;
pub mod live;
pub mod report;
pub mod sample;

pub use aggregator::{Aggregator, SampleSink};
pub use buckets::{BucketLayout, LatencyRange};
pub use report::{ReportBuilder, RunWindow, Statistics};
pub use sample::Sample;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cache-line aligned atomic counter to prevent false sharing
///
/// On most modern CPUs, cache lines are 64 bytes. Every worker bumps its own
/// counters on every request while the coordinator reads all of them, so each
/// counter gets its own cache line.
///
/// # Memory Layout
///
/// ```text
/// [value: 8 bytes][padding: 56 bytes] = 64 bytes total
/// ```
#[repr(align(64))]
#[derive(Debug)]
pub struct AlignedCounter {
    value: AtomicU64,
    _padding: [u8; 56],
}

impl AlignedCounter {
    /// Create a new counter with initial value 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; 56],
        }
    }

    /// Increment the counter by the specified amount
    ///
    /// `Ordering::Relaxed` is enough: readers only need an eventually
    /// consistent view for progress lines.
    #[inline]
    pub fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }

    /// Get the current value of the counter
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for AlignedCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Live progress counters owned by one worker
///
/// `sent` counts requests started, `done` counts requests whose sample has
/// been produced. Both only ever increase.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    pub sent: AlignedCounter,
    pub done: AlignedCounter,
}

impl WorkerCounters {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Summary of one duration series
///
/// Stores the running sum, extremes and count. An empty series has no
/// meaningful minimum or maximum, so the accessors return `None` until the
/// first value is recorded. `min_nanos` starts at `u64::MAX` which makes both
/// `record` and `merge` plain min/max folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStats {
    sum_nanos: u128,
    min_nanos: u64,
    max_nanos: u64,
    count: u64,
}

impl TimeStats {
    /// Create an empty series
    pub fn new() -> Self {
        Self {
            sum_nanos: 0,
            min_nanos: u64::MAX,
            max_nanos: 0,
            count: 0,
        }
    }

    /// Absorb one duration
    #[inline]
    pub fn record(&mut self, duration: Duration) {
        let nanos = duration_to_nanos(duration);
        self.sum_nanos += nanos as u128;
        self.min_nanos = self.min_nanos.min(nanos);
        self.max_nanos = self.max_nanos.max(nanos);
        self.count += 1;
    }

    /// Combine another series into this one
    ///
    /// Sums and counts add, extremes fold, so the result does not depend on
    /// merge order.
    pub fn merge(&mut self, other: &TimeStats) {
        self.sum_nanos += other.sum_nanos;
        self.min_nanos = self.min_nanos.min(other.min_nanos);
        self.max_nanos = self.max_nanos.max(other.max_nanos);
        self.count += other.count;
    }

    /// Number of recorded durations
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total of all recorded durations
    pub fn sum(&self) -> Duration {
        nanos_to_duration(self.sum_nanos)
    }

    /// Smallest recorded duration
    pub fn min(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(self.min_nanos))
    }

    /// Largest recorded duration
    pub fn max(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(self.max_nanos))
    }

    /// Average duration (integer nanoseconds, truncated)
    pub fn mean(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| nanos_to_duration(self.sum_nanos / self.count as u128))
    }
}

impl Default for TimeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters and timing series for one latency range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub count: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub transaction: TimeStats,
    pub response: TimeStats,
    pub setup: TimeStats,
}

impl BucketStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into this bucket
    pub fn record(&mut self, sample: &Sample) {
        self.count += 1;
        if sample.is_success() {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
        self.transaction.record(sample.transaction_time());
        self.response.record(sample.response_time());
        self.setup.record(sample.setup_time());
    }

    /// Combine another bucket into this one
    pub fn merge(&mut self, other: &BucketStats) {
        self.count += other.count;
        self.success_count += other.success_count;
        self.failed_count += other.failed_count;
        self.transaction.merge(&other.transaction);
        self.response.merge(&other.response);
        self.setup.merge(&other.setup);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[inline]
fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[inline]
fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
