//! Worker task implementation
//!
//! This module implements the Worker, the execution unit that issues
//! requests. Each worker runs as its own tokio task, sends requests one after
//! another and hands a timing sample for every attempt to the aggregator.
//!
//! # Architecture
//!
//! The Worker ties together:
//! - **StartGate**: the single wait point before the first request
//! - **RequestExecutor**: performs the request and returns a status
//! - **SampleSink**: bounded queue into the aggregator
//! - **WorkerCounters**: lock-free sent/done counters for progress lines
//!
//! A transport failure becomes a sample with status 400; it is never retried
//! and never stops the worker.

pub mod gate;

pub use gate::StartGate;

use crate::engine::{RequestExecutor, RequestSpec};
use crate::stats::sample::CLIENT_ERROR_STATUS;
use crate::stats::{Sample, SampleSink, WorkerCounters};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One simulated client
pub struct Worker<E: RequestExecutor> {
    id: usize,
    executor: Arc<E>,
    request: Arc<RequestSpec>,
    sink: SampleSink,
    gate: Arc<StartGate>,
    stop: CancellationToken,
    counters: Arc<WorkerCounters>,
    /// Requests to send, `None` for unbounded
    limit: Option<u64>,
    /// Pause between requests
    sleep_interval: Option<Duration>,
}

impl<E: RequestExecutor> Worker<E> {
    /// Create a worker
    ///
    /// # Arguments
    ///
    /// * `id` - Worker index, carried into every sample
    /// * `executor` - Shared request engine
    /// * `request` - Request to send on every iteration
    /// * `sink` - Producer side of the aggregator queue
    /// * `gate` - Start gate shared by every worker of the run
    /// * `stop` - Cancelled when no new request may start
    pub fn new(
        id: usize,
        executor: Arc<E>,
        request: Arc<RequestSpec>,
        sink: SampleSink,
        gate: Arc<StartGate>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            id,
            executor,
            request,
            sink,
            gate,
            stop,
            counters: Arc::new(WorkerCounters::new()),
            limit: None,
            sleep_interval: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sleep_interval(mut self, sleep_interval: Option<Duration>) -> Self {
        self.sleep_interval = sleep_interval;
        self
    }

    /// Live counters, readable while the worker runs
    pub fn counters(&self) -> Arc<WorkerCounters> {
        Arc::clone(&self.counters)
    }

    /// Run until the limit is reached or the stop token fires
    ///
    /// Returns the number of requests issued.
    pub async fn run(self) -> u64 {
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => {
                debug!(worker = self.id, "stopped before start");
                return 0;
            }
            _ = self.gate.wait() => {}
        }

        let mut issued = 0u64;
        while self.limit.map_or(true, |limit| issued < limit) && !self.stop.is_cancelled() {
            let sample = self.execute_once().await;
            issued += 1;

            if let Err(e) = self.sink.push(sample).await {
                warn!(worker = self.id, error = %e, "dropping out, aggregator gone");
                break;
            }
            self.counters.done.add(1);

            if let Some(pause) = self.sleep_interval {
                tokio::select! {
                    _ = self.stop.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        debug!(worker = self.id, issued, "worker finished");
        issued
    }

    /// Issue one request and time it
    async fn execute_once(&self) -> Sample {
        self.counters.sent.add(1);
        let start = Instant::now();
        let payload = self.request.payload();

        let send = Instant::now();
        let result = self.executor.execute(&self.request).await;
        let end = Instant::now();

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                debug!(worker = self.id, error = %e, "request failed");
                CLIENT_ERROR_STATUS
            }
        };

        Sample::new(self.id, payload, status, start, send, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::workload::HttpMethod;
    use crate::engine::mock::MockEngine;
    use crate::stats::{Aggregator, BucketLayout};

    struct Harness {
        aggregator: Arc<Aggregator>,
        gate: Arc<StartGate>,
        stop: CancellationToken,
        consumer: tokio::task::JoinHandle<()>,
        sink: SampleSink,
    }

    fn harness() -> Harness {
        let aggregator = Arc::new(Aggregator::new(BucketLayout::Standard));
        let (sink, receiver) = aggregator.channel(1);
        let consumer = tokio::spawn(Arc::clone(&aggregator).consume(receiver));
        Harness {
            aggregator,
            gate: Arc::new(StartGate::new(1)),
            stop: CancellationToken::new(),
            consumer,
            sink,
        }
    }

    fn worker(h: &Harness, engine: MockEngine) -> Worker<MockEngine> {
        Worker::new(
            0,
            Arc::new(engine),
            Arc::new(RequestSpec::new(HttpMethod::Get, "http://mock/")),
            h.sink.clone(),
            Arc::clone(&h.gate),
            h.stop.clone(),
        )
    }

    #[tokio::test]
    async fn test_runs_exactly_limit() {
        let h = harness();
        let engine = MockEngine::new();
        let w = worker(&h, engine.clone()).with_limit(Some(7));
        let counters = w.counters();

        h.gate.open();
        assert_eq!(w.run().await, 7);
        assert_eq!(engine.call_count(), 7);
        assert_eq!(counters.sent.get(), 7);
        assert_eq!(counters.done.get(), 7);

        drop(h.sink);
        h.aggregator.wait_drained().await;
        assert_eq!(h.aggregator.total_count(), 7);
        h.consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_done_counts_only_delivered_samples() {
        let aggregator = Arc::new(Aggregator::new(BucketLayout::Standard));
        let (sink, receiver) = aggregator.channel(1);
        drop(receiver);

        let gate = Arc::new(StartGate::new(1));
        let engine = MockEngine::new();
        let w = Worker::new(
            0,
            Arc::new(engine.clone()),
            Arc::new(RequestSpec::new(HttpMethod::Get, "http://mock/")),
            sink,
            Arc::clone(&gate),
            CancellationToken::new(),
        )
        .with_limit(Some(3));
        let counters = w.counters();

        gate.open();
        assert_eq!(w.run().await, 1);
        assert_eq!(engine.call_count(), 1);
        assert_eq!(counters.sent.get(), 1);
        assert_eq!(counters.done.get(), 0);
        assert_eq!(aggregator.pending(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_400() {
        let h = harness();
        let w = worker(&h, MockEngine::new().with_failures([0])).with_limit(Some(2));

        h.gate.open();
        w.run().await;
        drop(h.sink);
        h.aggregator.wait_drained().await;

        let failed: u64 = h.aggregator.snapshot().iter().map(|b| b.failed_count).sum();
        let success: u64 = h.aggregator.snapshot().iter().map(|b| b.success_count).sum();
        assert_eq!(failed, 1);
        assert_eq!(success, 1);
        h.consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_no_request_before_every_worker_arrived() {
        let aggregator = Arc::new(Aggregator::new(BucketLayout::Standard));
        let (sink, receiver) = aggregator.channel(4);
        let consumer = tokio::spawn(Arc::clone(&aggregator).consume(receiver));
        let gate = Arc::new(StartGate::new(4));
        let engine = MockEngine::new();

        let mut handles = Vec::new();
        for id in 0..4 {
            let w = Worker::new(
                id,
                Arc::new(engine.clone()),
                Arc::new(RequestSpec::new(HttpMethod::Get, "http://mock/")),
                sink.clone(),
                Arc::clone(&gate),
                CancellationToken::new(),
            )
            .with_limit(Some(2));
            handles.push(tokio::spawn(w.run()));
        }
        drop(sink);

        tokio::time::timeout(Duration::from_secs(1), gate.wait_all_ready())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.call_count(), 0);

        let opened = Instant::now();
        gate.open();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 2);
        }

        let call_times = engine.call_times();
        assert_eq!(call_times.len(), 8);
        assert!(call_times.iter().all(|t| *t >= opened));
        consumer.await.unwrap();
        assert_eq!(aggregator.total_count(), 8);
    }

    #[tokio::test]
    async fn test_stop_before_gate_issues_nothing() {
        let h = harness();
        let engine = MockEngine::new();
        let w = worker(&h, engine.clone()).with_limit(Some(5));

        h.stop.cancel();
        assert_eq!(w.run().await, 0);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_ends_unbounded_worker() {
        let h = harness();
        let engine = MockEngine::new().with_latency(Duration::from_millis(2));
        let w = worker(&h, engine.clone());

        h.gate.open();
        let handle = tokio::spawn(w.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        h.stop.cancel();

        let issued = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(issued > 0);
        assert_eq!(issued, engine.call_count());
    }

    #[tokio::test]
    async fn test_sleep_interval_cut_short_by_stop() {
        let h = harness();
        let w = worker(&h, MockEngine::new()).with_sleep_interval(Some(Duration::from_secs(60)));

        h.gate.open();
        let handle = tokio::spawn(w.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.stop.cancel();

        let issued = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(issued, 1);
    }
}
