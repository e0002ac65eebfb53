//! Mock request engine for testing
//!
//! This module provides a mock implementation of the `RequestExecutor` trait.
//! It never touches the network, which makes coordinator and worker tests fast
//! and deterministic.
//!
//! # Features
//!
//! - Configurable status code
//! - Configurable latency (fixed or spread over a range)
//! - Failure schedule by call index, or fail everything
//! - Thread-safe call tracking
//!
//! # Example
//!
//! ```
//! use reqpulse::config::workload::HttpMethod;
//! use reqpulse::engine::{mock::MockEngine, RequestExecutor, RequestSpec};
//!
//! # tokio_test_block(async {
//! let engine = MockEngine::new().with_status(204);
//! let spec = RequestSpec::new(HttpMethod::Get, "http://mock/");
//! assert_eq!(engine.execute(&spec).await.unwrap(), 204);
//! assert_eq!(engine.call_count(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

use super::{RequestExecutor, RequestSpec};
use crate::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock request engine
///
/// Clones share state, so a test can keep a handle while workers use another.
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Status returned by successful calls
    status: u16,

    /// Latency range; each call picks a point in it from its call index
    latency: (Duration, Duration),

    /// Whether every call should fail
    should_fail: Arc<Mutex<bool>>,

    /// Zero-based call indices that fail with a transport error
    fail_on: Arc<Mutex<HashSet<u64>>>,

    /// Number of calls started
    calls: Arc<AtomicU64>,

    /// When each call started, in call order
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl MockEngine {
    /// Create a mock that answers 200 immediately
    pub fn new() -> Self {
        Self {
            status: 200,
            latency: (Duration::ZERO, Duration::ZERO),
            should_fail: Arc::new(Mutex::new(false)),
            fail_on: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(AtomicU64::new(0)),
            call_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Every call takes exactly `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (latency, latency);
        self
    }

    /// Calls take between `min` and `max`, cycling deterministically
    pub fn with_latency_range(mut self, min: Duration, max: Duration) -> Self {
        self.latency = (min, max.max(min));
        self
    }

    /// Fail the calls with these zero-based indices
    pub fn with_failures(self, indices: impl IntoIterator<Item = u64>) -> Self {
        self.fail_on.lock().unwrap().extend(indices);
        self
    }

    /// Configure the engine to fail all calls
    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }

    /// Number of calls started so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Start instants of every call so far
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn latency_for(&self, index: u64) -> Duration {
        let (min, max) = self.latency;
        if max == min {
            return min;
        }
        // Seven evenly spaced points between min and max inclusive
        let step = index % 7;
        min + (max - min) * step as u32 / 6
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestExecutor for MockEngine {
    async fn execute(&self, _request: &RequestSpec) -> Result<u16> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());

        let latency = self.latency_for(index);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let fail = *self.should_fail.lock().unwrap() || self.fail_on.lock().unwrap().contains(&index);
        if fail {
            anyhow::bail!("mock transport failure on call {}", index);
        }

        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::workload::HttpMethod;

    fn spec() -> RequestSpec {
        RequestSpec::new(HttpMethod::Get, "http://mock/")
    }

    #[tokio::test]
    async fn test_default_succeeds() {
        let engine = MockEngine::new();
        assert_eq!(engine.execute(&spec()).await.unwrap(), 200);
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_schedule() {
        let engine = MockEngine::new().with_failures([1]);
        assert!(engine.execute(&spec()).await.is_ok());
        assert!(engine.execute(&spec()).await.is_err());
        assert!(engine.execute(&spec()).await.is_ok());
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn test_should_fail_shared_between_clones() {
        let engine = MockEngine::new();
        let handle = engine.clone();
        handle.set_should_fail(true);
        assert!(engine.execute(&spec()).await.is_err());
        assert_eq!(handle.call_count(), 1);
    }

    #[tokio::test]
    async fn test_latency_is_applied() {
        let engine = MockEngine::new().with_latency(Duration::from_millis(20));
        let start = Instant::now();
        engine.execute(&spec()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_latency_range_spread() {
        let engine = MockEngine::new()
            .with_latency_range(Duration::from_millis(10), Duration::from_millis(16));
        let spread: Vec<_> = (0..8).map(|i| engine.latency_for(i)).collect();
        assert_eq!(spread[0], Duration::from_millis(10));
        assert_eq!(spread[6], Duration::from_millis(16));
        assert_eq!(spread[7], Duration::from_millis(10));
        assert!(spread.iter().all(|d| *d >= Duration::from_millis(10) && *d <= Duration::from_millis(16)));
    }
}
