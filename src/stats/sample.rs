//! Per-request measurement
//!
//! A `Sample` is produced once per request attempt and handed to the
//! aggregator by value. Timestamps are monotonic instants; the derived
//! durations saturate at zero so a reordered clock read can never panic.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status recorded when the transport fails before any response arrives
pub const CLIENT_ERROR_STATUS: u16 = 400;

/// Timing breakdown of one request attempt
#[derive(Debug, Clone)]
pub struct Sample {
    worker_id: usize,
    payload: Arc<str>,
    status: u16,
    start: Instant,
    send: Instant,
    end: Instant,
}

impl Sample {
    /// Create a sample
    ///
    /// # Arguments
    ///
    /// * `worker_id` - Worker that issued the request
    /// * `payload` - Short description of the request (method and target)
    /// * `status` - HTTP status, or `CLIENT_ERROR_STATUS` for transport failures
    /// * `start` - When request preparation began
    /// * `send` - Immediately before the request was dispatched
    /// * `end` - Immediately after the response (or failure) was observed
    pub fn new(
        worker_id: usize,
        payload: Arc<str>,
        status: u16,
        start: Instant,
        send: Instant,
        end: Instant,
    ) -> Self {
        Self {
            worker_id,
            payload,
            status,
            start,
            send,
            end,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Statuses below 400 count as available
    pub fn is_success(&self) -> bool {
        self.status < CLIENT_ERROR_STATUS
    }

    /// Preparation start to response completion
    pub fn transaction_time(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }

    /// Dispatch to response completion
    pub fn response_time(&self) -> Duration {
        self.end.saturating_duration_since(self.send)
    }

    /// Preparation start to dispatch
    pub fn setup_time(&self) -> Duration {
        self.send.saturating_duration_since(self.start)
    }
}
