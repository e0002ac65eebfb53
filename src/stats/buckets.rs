//! Fixed latency range tables
//!
//! Response times are classified into a small, fixed set of ordered,
//! non-overlapping ranges. Each range has an exclusive upper bound, so a
//! response time exactly on a bound belongs to the next range. The last range
//! of every table is an unbounded catch-all, so classification is total.
//!
//! Two tables are available:
//!
//! - **Standard** (default): 12 ranges from 1ms up to 10 minutes
//! - **Fine**: 18 ranges with millisecond and second granularity up to 1 minute

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One latency range: a display label and an exclusive upper bound
///
/// `upper == None` marks the final catch-all range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyRange {
    pub label: &'static str,
    pub upper: Option<Duration>,
}

impl LatencyRange {
    const fn upto(label: &'static str, upper: Duration) -> Self {
        Self { label, upper: Some(upper) }
    }

    const fn beyond(label: &'static str) -> Self {
        Self { label, upper: None }
    }

    /// Whether `latency` falls below this range's upper bound
    #[inline]
    pub fn admits(&self, latency: Duration) -> bool {
        self.upper.map_or(true, |upper| latency < upper)
    }
}

const fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

const fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

static STANDARD_RANGES: [LatencyRange; 12] = [
    LatencyRange::upto("LE   1 ms", ms(1)),
    LatencyRange::upto("LE   5 ms", ms(5)),
    LatencyRange::upto("LE  10 ms", ms(10)),
    LatencyRange::upto("LE  20 ms", ms(20)),
    LatencyRange::upto("LE  50 ms", ms(50)),
    LatencyRange::upto("LE 100 ms", ms(100)),
    LatencyRange::upto("LE 500 ms", ms(500)),
    LatencyRange::upto("LE   1 sec", secs(1)),
    LatencyRange::upto("LE   1 min", secs(60)),
    LatencyRange::upto("LE   5 min", secs(5 * 60)),
    LatencyRange::upto("LE  10 min", secs(10 * 60)),
    LatencyRange::beyond("GT  10 min"),
];

static FINE_RANGES: [LatencyRange; 18] = [
    LatencyRange::upto("LE  1  ms", ms(1)),
    LatencyRange::upto("LE  2  ms", ms(2)),
    LatencyRange::upto("LE  3  ms", ms(3)),
    LatencyRange::upto("LE  4  ms", ms(4)),
    LatencyRange::upto("LE  5  ms", ms(5)),
    LatencyRange::upto("LE 10  ms", ms(10)),
    LatencyRange::upto("LE 20  ms", ms(20)),
    LatencyRange::upto("LE 30  ms", ms(30)),
    LatencyRange::upto("LE  1 Sec", secs(1)),
    LatencyRange::upto("LE  2 Sec", secs(2)),
    LatencyRange::upto("LE  3 Sec", secs(3)),
    LatencyRange::upto("LE  4 Sec", secs(4)),
    LatencyRange::upto("LE  5 Sec", secs(5)),
    LatencyRange::upto("LE 10 Sec", secs(10)),
    LatencyRange::upto("LE 20 Sec", secs(20)),
    LatencyRange::upto("LE 30 Sec", secs(30)),
    LatencyRange::upto("LE  1 Min", secs(60)),
    LatencyRange::beyond("GT  1 Min"),
];

/// Selectable latency range table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketLayout {
    #[default]
    Standard,
    Fine,
}

impl BucketLayout {
    /// The ordered range table for this layout
    pub fn ranges(&self) -> &'static [LatencyRange] {
        match self {
            BucketLayout::Standard => &STANDARD_RANGES,
            BucketLayout::Fine => &FINE_RANGES,
        }
    }

    /// Number of ranges (and therefore buckets)
    pub fn len(&self) -> usize {
        self.ranges().len()
    }

    /// Index of the range a response time belongs to
    ///
    /// Bounds are ascending, so the first range whose bound lies above
    /// `latency` is found with a binary search. The catch-all never rejects, which keeps the
    /// result in bounds for any duration.
    pub fn classify(&self, latency: Duration) -> usize {
        self.ranges().partition_point(|range| !range.admits(latency))
    }

    /// Label of the range at `index`
    pub fn label(&self, index: usize) -> &'static str {
        self.ranges()[index].label
    }
}

impl fmt::Display for BucketLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketLayout::Standard => write!(f, "standard ({} ranges)", self.len()),
            BucketLayout::Fine => write!(f, "fine ({} ranges)", self.len()),
        }
    }
}
