//! Final statistics
//!
//! `ReportBuilder` turns the aggregator's buckets into one `Statistics`
//! record. It runs at most once per run: the first caller wins a
//! compare-and-set and every later caller gets `None`.

use crate::stats::{Aggregator, BucketLayout, BucketStats, TimeStats};
use crate::util::time::calculate_rate;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Wall-clock and monotonic extent of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl RunWindow {
    pub fn new(started_at: DateTime<Local>, finished_at: DateTime<Local>, elapsed: Duration) -> Self {
        Self {
            started_at,
            finished_at,
            elapsed,
        }
    }

    /// A run that never started: zero elapsed time at `at`
    pub fn empty(at: DateTime<Local>) -> Self {
        Self::new(at, at, Duration::ZERO)
    }
}

/// Label and sample count of one non-empty latency range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCount {
    pub label: &'static str,
    pub count: u64,
}

/// Final, read-only result of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub layout: BucketLayout,
    /// Non-empty ranges in ascending order
    pub ranges: Vec<RangeCount>,
    /// All buckets merged
    pub totals: BucketStats,
    pub window: RunWindow,
}

impl Statistics {
    /// Merge every non-empty bucket into one totals record
    ///
    /// `buckets` must be in range order for `layout`.
    pub fn from_buckets(layout: BucketLayout, buckets: &[BucketStats], window: RunWindow) -> Self {
        let mut totals = BucketStats::new();
        let mut ranges = Vec::new();

        for (range, bucket) in layout.ranges().iter().zip(buckets) {
            if bucket.is_empty() {
                continue;
            }
            totals.merge(bucket);
            ranges.push(RangeCount {
                label: range.label,
                count: bucket.count,
            });
        }

        Self {
            layout,
            ranges,
            totals,
            window,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.totals.count
    }

    pub fn success_count(&self) -> u64 {
        self.totals.success_count
    }

    pub fn failed_count(&self) -> u64 {
        self.totals.failed_count
    }

    pub fn elapsed(&self) -> Duration {
        self.window.elapsed
    }

    /// Requests per second over the run window, 0 for an empty window
    pub fn throughput(&self) -> f64 {
        calculate_rate(self.total_count(), self.window.elapsed)
    }

    /// Percentage of requests with a status below 400, 0 when nothing ran
    pub fn availability(&self) -> f64 {
        if self.total_count() == 0 {
            return 0.0;
        }
        self.success_count() as f64 / self.total_count() as f64 * 100.0
    }

    pub fn response(&self) -> &TimeStats {
        &self.totals.response
    }

    pub fn transaction(&self) -> &TimeStats {
        &self.totals.transaction
    }

    pub fn setup(&self) -> &TimeStats {
        &self.totals.setup
    }
}

/// Exactly-once finalizer
#[derive(Debug, Default)]
pub struct ReportBuilder {
    finalized: AtomicBool,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some caller already won the right to finalize
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Build the final statistics
    ///
    /// Waits for every pushed sample to be bucketed before merging. Only the
    /// first call does any work; concurrent or later calls return `None`.
    pub async fn finalize(&self, aggregator: &Aggregator, window: RunWindow) -> Option<Statistics> {
        if self
            .finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("finalize already claimed");
            return None;
        }

        aggregator.wait_drained().await;
        let stats = Statistics::from_buckets(aggregator.layout(), &aggregator.snapshot(), window);
        debug!(
            total = stats.total_count(),
            failed = stats.failed_count(),
            elapsed_ms = stats.elapsed().as_millis() as u64,
            "statistics finalized"
        );
        Some(stats)
    }
}
