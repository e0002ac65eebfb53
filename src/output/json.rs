//! JSON output formatting
//!
//! The JSON export carries every figure of the text report. Durations are
//! given both in microseconds and in human-readable form.

use crate::coordinator::StopReason;
use crate::stats::{Statistics, TimeStats};
use crate::util::time::format_wall_clock;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        let micros = d.as_micros() as u64;
        let human = format_duration_human(d);
        Self { micros, human }
    }
}

/// Min/max/avg of one timing series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonTiming {
    pub min: JsonDuration,
    pub max: JsonDuration,
    pub avg: JsonDuration,
}

impl JsonTiming {
    fn from_series(series: &TimeStats) -> Self {
        Self {
            min: JsonDuration::from_duration(series.min().unwrap_or_default()),
            max: JsonDuration::from_duration(series.max().unwrap_or_default()),
            avg: JsonDuration::from_duration(series.mean().unwrap_or_default()),
        }
    }
}

/// Sample count of one latency range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRange {
    pub label: String,
    pub count: u64,
}

/// Complete report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub started_at: String,
    pub finished_at: String,
    pub stop_reason: String,
    pub bucket_layout: String,
    pub elapsed: JsonDuration,
    pub total_count: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub throughput_per_sec: f64,
    pub availability_percent: f64,
    /// Non-empty ranges, largest first
    pub ranges: Vec<JsonRange>,
    pub response_time: JsonTiming,
    pub transaction_time: JsonTiming,
    pub setup_time: JsonTiming,
}

impl JsonReport {
    pub fn new(stats: &Statistics, reason: StopReason) -> Self {
        Self {
            started_at: format_wall_clock(&stats.window.started_at),
            finished_at: format_wall_clock(&stats.window.finished_at),
            stop_reason: reason.to_string(),
            bucket_layout: stats.layout.to_string(),
            elapsed: JsonDuration::from_duration(stats.elapsed()),
            total_count: stats.total_count(),
            success_count: stats.success_count(),
            failed_count: stats.failed_count(),
            throughput_per_sec: stats.throughput(),
            availability_percent: stats.availability(),
            ranges: stats
                .ranges
                .iter()
                .rev()
                .map(|r| JsonRange {
                    label: r.label.to_string(),
                    count: r.count,
                })
                .collect(),
            response_time: JsonTiming::from_series(stats.response()),
            transaction_time: JsonTiming::from_series(stats.transaction()),
            setup_time: JsonTiming::from_series(stats.setup()),
        }
    }
}

/// Write the report as pretty JSON
pub fn write_json_report(path: &Path, report: &JsonReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON output: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write JSON output: {}", path.display()))?;
    Ok(())
}

/// Format duration in human-readable format
fn format_duration_human(d: Duration) -> String {
    let micros = d.as_micros() as u64;

    if micros == 0 {
        return "0µs".to_string();
    }

    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.3}ms", micros as f64 / 1000.0)
    } else if micros < 60_000_000 {
        format!("{:.3}s", micros as f64 / 1_000_000.0)
    } else if micros < 3_600_000_000 {
        format!("{:.2}m", micros as f64 / 60_000_000.0)
    } else {
        format!("{:.2}h", micros as f64 / 3_600_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Aggregator, BucketLayout, RunWindow, Sample};
    use chrono::Local;
    use std::sync::Arc;
    use std::time::Instant;

    fn statistics() -> Statistics {
        let aggregator = Aggregator::new(BucketLayout::Standard);
        let start = Instant::now();
        for (ms, status) in [(4, 200), (12, 200), (12, 502)] {
            let end = start + Duration::from_millis(ms);
            aggregator.record(&Sample::new(0, Arc::from("GET /"), status, start, start, end));
        }
        let now = Local::now();
        Statistics::from_buckets(
            aggregator.layout(),
            &aggregator.snapshot(),
            RunWindow::new(now, now, Duration::from_secs(3)),
        )
    }

    #[test]
    fn test_format_duration_human() {
        assert_eq!(format_duration_human(Duration::ZERO), "0µs");
        assert_eq!(format_duration_human(Duration::from_micros(250)), "250µs");
        assert_eq!(format_duration_human(Duration::from_micros(1500)), "1.500ms");
        assert_eq!(format_duration_human(Duration::from_secs(2)), "2.000s");
        assert_eq!(format_duration_human(Duration::from_secs(90)), "1.50m");
    }

    #[test]
    fn test_report_headline_figures() {
        let report = JsonReport::new(&statistics(), StopReason::Completed);
        assert_eq!(report.total_count, 3);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.throughput_per_sec, 1.0);
        assert_eq!(report.stop_reason, "completed");
        assert_eq!(report.ranges[0].label, "LE  20 ms");
        assert_eq!(report.ranges[0].count, 2);
        assert_eq!(report.response_time.max.micros, 12_000);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = JsonReport::new(&statistics(), StopReason::Deadline);

        write_json_report(&path, &report).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: JsonReport = serde_json::from_str(&contents).unwrap();

        assert_eq!(parsed.total_count, report.total_count);
        assert_eq!(parsed.availability_percent, report.availability_percent);
        assert_eq!(parsed.stop_reason, "time limit reached");
        assert_eq!(parsed.ranges, report.ranges);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let report = JsonReport::new(&statistics(), StopReason::Completed);
        assert!(write_json_report(Path::new("/nonexistent/dir/report.json"), &report).is_err());
    }
}
