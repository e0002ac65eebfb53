//! Timing and formatting helpers
//!
//! Measured durations always come from `std::time::Instant`; wall-clock
//! timestamps are only used for the human-facing run header and footer.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Wall-clock timestamp layout used in `Starting at:` and `Finished at:` lines
pub const WALL_CLOCK_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.6f";

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use reqpulse::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Calculate a per-second rate from a count and a duration
///
/// # Arguments
///
/// * `count` - Number of events observed
/// * `duration` - Time over which they were observed
///
/// # Returns
///
/// Events per second, or 0 if duration is zero
pub fn calculate_rate(count: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// Render a wall-clock timestamp the way run headers and reports show it
pub fn format_wall_clock(at: &DateTime<Local>) -> String {
    at.format(WALL_CLOCK_FORMAT).to_string()
}
