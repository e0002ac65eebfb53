//! Human-readable text output

use crate::stats::{Statistics, TimeStats};
use crate::util::time::{format_duration, format_wall_clock};
use std::fmt::Write;

/// Render the final report
///
/// Layout:
/// - `Finished at:` timestamp
/// - one `label: count: N` line per non-empty range, largest range first
/// - totals, elapsed time, throughput, availability and failures
/// - min/max/avg table for response, transaction and setup time
pub fn render_report(stats: &Statistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "Finished at: {}", format_wall_clock(&stats.window.finished_at));
    let _ = writeln!(out);
    let _ = writeln!(out, "performance statistics:");
    for range in stats.ranges.iter().rev() {
        let _ = writeln!(out, "{}: count: {}", range.label, range.count);
    }
    let _ = writeln!(out, "-----------------------");
    let _ = writeln!(out, "Total Count: {}", stats.total_count());
    let _ = writeln!(out);
    let _ = writeln!(out, "Elapsed Time: {:.3}s", stats.elapsed().as_secs_f64());
    let _ = writeln!(out, "Throughput: {:.3} per/sec", stats.throughput());
    let _ = writeln!(out, "Availability: {:.2}%", stats.availability());
    let _ = writeln!(out, "Failed: {}", stats.failed_count());
    let _ = writeln!(out);
    let _ = writeln!(out, "Connection Times");
    let _ = writeln!(out, "{:<25}{:<15}{:<15}{:<15}", "", "min", "max", "avg");
    let _ = writeln!(out, "{}", timing_row("Response time:", stats.response()));
    let _ = writeln!(out, "{}", timing_row("Transaction time:", stats.transaction()));
    let _ = writeln!(out, "{}", timing_row("Setup time:", stats.setup()));

    out
}

/// Print the final report to stdout
pub fn print_report(stats: &Statistics) {
    println!();
    print!("{}", render_report(stats));
}

/// One row of the timing table; an empty series shows zeros
fn timing_row(name: &str, series: &TimeStats) -> String {
    let min = series.min().unwrap_or_default();
    let max = series.max().unwrap_or_default();
    let avg = series.mean().unwrap_or_default();
    format!(
        "{:<25}{:<15}{:<15}{:<15}",
        name,
        format_duration(min),
        format_duration(max),
        format_duration(avg)
    )
    .trim_end()
    .to_string()
}

/// Format number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Aggregator, BucketLayout, BucketStats, RunWindow, Sample};
    use chrono::Local;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn sample(response_ms: u64, status: u16) -> Sample {
        let start = Instant::now();
        Sample::new(0, Arc::from("GET /"), status, start, start, start + Duration::from_millis(response_ms))
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_render_ranges_largest_first() {
        let aggregator = Aggregator::new(BucketLayout::Standard);
        aggregator.record(&sample(1, 200));
        aggregator.record(&sample(15, 200));
        aggregator.record(&sample(15, 500));

        let now = Local::now();
        let stats = Statistics::from_buckets(
            aggregator.layout(),
            &aggregator.snapshot(),
            RunWindow::new(now, now, Duration::from_millis(1500)),
        );
        let text = render_report(&stats);

        let twenty = text.find("LE  20 ms: count: 2").expect("20ms line");
        let five = text.find("LE   5 ms: count: 1").expect("5ms line");
        assert!(twenty < five);
        assert!(!text.contains("LE   1 ms"));
        assert!(text.contains("Total Count: 3"));
        assert!(text.contains("Elapsed Time: 1.500s"));
        assert!(text.contains("Throughput: 2.000 per/sec"));
        assert!(text.contains("Availability: 66.67%"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains("Response time:"));
        assert!(text.contains("Setup time:"));
    }

    #[test]
    fn test_render_empty_report() {
        let layout = BucketLayout::Fine;
        let stats = Statistics::from_buckets(
            layout,
            &vec![BucketStats::new(); layout.len()],
            RunWindow::empty(Local::now()),
        );
        let text = render_report(&stats);

        assert!(text.contains("Total Count: 0"));
        assert!(text.contains("Elapsed Time: 0.000s"));
        assert!(text.contains("Throughput: 0.000 per/sec"));
        assert!(text.contains("Availability: 0.00%"));
        assert!(!text.contains("count:"));
        assert!(text.contains("Response time:           0ns"));
    }
}
