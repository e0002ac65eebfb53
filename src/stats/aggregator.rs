//! Sample aggregation
//!
//! This module provides the single consumer that turns a stream of samples
//! from many workers into per-range bucket statistics.
//!
//! # Features
//!
//! - **Bounded queue**: workers wait for a free slot instead of dropping samples
//! - **Range bucketing**: each sample lands in exactly one latency range
//! - **Drain tracking**: a pending counter tells when every pushed sample is absorbed
//!
//! # Example
//!
//! ```
//! use reqpulse::stats::{Aggregator, BucketLayout, Sample};
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let aggregator = Arc::new(Aggregator::new(BucketLayout::Standard));
//! let (sink, receiver) = aggregator.channel(4);
//! let consumer = tokio::spawn(Arc::clone(&aggregator).consume(receiver));
//!
//! let start = Instant::now();
//! let sample = Sample::new(0, Arc::from("GET /"), 200, start, start, start + Duration::from_millis(3));
//! sink.push(sample).await.unwrap();
//! drop(sink);
//!
//! aggregator.wait_drained().await;
//! consumer.await.unwrap();
//! assert_eq!(aggregator.total_count(), 1);
//! # });
//! ```

use crate::stats::{BucketLayout, BucketStats, Sample};
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Notify};
use tracing::debug;

/// Smallest queue capacity regardless of worker count
const MIN_CHANNEL_CAPACITY: usize = 64;

/// Bucketed statistics for one run
///
/// Bucket mutation is serialized by one lock. Every sample is counted in
/// `pending` before it enters the queue and released after it has been
/// bucketed, so `wait_drained` returns only once nothing is in flight.
#[derive(Debug)]
pub struct Aggregator {
    layout: BucketLayout,
    buckets: Mutex<Vec<BucketStats>>,
    pending: AtomicU64,
    drained: Notify,
}

impl Aggregator {
    /// Create an aggregator with one empty bucket per range of `layout`
    pub fn new(layout: BucketLayout) -> Self {
        Self {
            layout,
            buckets: Mutex::new(vec![BucketStats::new(); layout.len()]),
            pending: AtomicU64::new(0),
            drained: Notify::new(),
        }
    }

    /// Queue capacity for a run with `concurrency` workers
    pub fn channel_capacity(concurrency: usize) -> usize {
        concurrency.saturating_add(1).max(MIN_CHANNEL_CAPACITY)
    }

    /// Create the sample queue feeding this aggregator
    ///
    /// The returned sink is cloned into every worker; the receiver goes to
    /// [`Aggregator::consume`].
    pub fn channel(self: &Arc<Self>, concurrency: usize) -> (SampleSink, mpsc::Receiver<Sample>) {
        let (tx, rx) = mpsc::channel(Self::channel_capacity(concurrency));
        let sink = SampleSink {
            tx,
            aggregator: Arc::clone(self),
        };
        (sink, rx)
    }

    /// Consumer loop; ends when every sink has been dropped
    pub async fn consume(self: Arc<Self>, mut receiver: mpsc::Receiver<Sample>) {
        let mut absorbed = 0u64;
        while let Some(sample) = receiver.recv().await {
            self.record(&sample);
            self.release_one();
            absorbed += 1;
        }
        debug!(absorbed, "aggregator queue closed");
    }

    /// Classify one sample by response time and fold it into its bucket
    pub fn record(&self, sample: &Sample) {
        let index = self.layout.classify(sample.response_time());
        self.lock_buckets()[index].record(sample);
    }

    /// Samples pushed but not yet bucketed
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait until every pushed sample has been bucketed
    pub async fn wait_drained(&self) {
        loop {
            // Register before checking so a release in between is not missed
            let notified = self.drained.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Copy of the current bucket array, in range order
    pub fn snapshot(&self) -> Vec<BucketStats> {
        self.lock_buckets().clone()
    }

    /// Number of samples bucketed so far
    pub fn total_count(&self) -> u64 {
        self.lock_buckets().iter().map(|b| b.count).sum()
    }

    pub fn layout(&self) -> BucketLayout {
        self.layout
    }

    fn reserve_one(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    fn release_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn lock_buckets(&self) -> MutexGuard<'_, Vec<BucketStats>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer handle given to each worker
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::Sender<Sample>,
    aggregator: Arc<Aggregator>,
}

impl SampleSink {
    /// Hand a sample to the aggregator
    ///
    /// Waits for queue space when the consumer is behind. The pending counter
    /// is raised only once a slot is held, and nothing between raising it and
    /// sending can be interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer has already stopped.
    pub async fn push(&self, sample: Sample) -> Result<()> {
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| anyhow::anyhow!("aggregator queue closed"))?;
        self.aggregator.reserve_one();
        permit.send(sample);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn sample_with(response_ms: u64, status: u16) -> Sample {
        let start = Instant::now();
        let send = start + Duration::from_millis(1);
        Sample::new(0, Arc::from("GET /"), status, start, send, send + Duration::from_millis(response_ms))
    }

    fn position(layout: BucketLayout, label: &str) -> usize {
        layout.ranges().iter().position(|r| r.label == label).unwrap()
    }

    #[test]
    fn test_channel_capacity() {
        assert_eq!(Aggregator::channel_capacity(1), 64);
        assert_eq!(Aggregator::channel_capacity(63), 64);
        assert_eq!(Aggregator::channel_capacity(100), 101);
    }

    #[test]
    fn test_record_classifies_by_response_time() {
        let aggregator = Aggregator::new(BucketLayout::Standard);
        aggregator.record(&sample_with(15, 200));
        aggregator.record(&sample_with(15, 500));
        aggregator.record(&sample_with(700, 200));

        let buckets = aggregator.snapshot();
        let twenty = position(BucketLayout::Standard, "LE  20 ms");
        let one_sec = position(BucketLayout::Standard, "LE   1 sec");
        assert_eq!(buckets[twenty].count, 2);
        assert_eq!(buckets[twenty].failed_count, 1);
        assert_eq!(buckets[one_sec].count, 1);
        assert_eq!(aggregator.total_count(), 3);
    }

    #[tokio::test]
    async fn test_wait_drained_with_nothing_pushed() {
        let aggregator = Aggregator::new(BucketLayout::Fine);
        tokio::time::timeout(Duration::from_secs(1), aggregator.wait_drained())
            .await
            .expect("empty aggregator should be drained");
    }

    #[tokio::test]
    async fn test_every_pushed_sample_is_counted() {
        let aggregator = Arc::new(Aggregator::new(BucketLayout::Standard));
        let (sink, receiver) = aggregator.channel(4);
        let consumer = tokio::spawn(Arc::clone(&aggregator).consume(receiver));

        let mut producers = Vec::new();
        for _ in 0..4 {
            let sink = sink.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..250u64 {
                    sink.push(sample_with(i % 40, 200)).await.unwrap();
                }
            }));
        }
        drop(sink);
        for producer in producers {
            producer.await.unwrap();
        }

        aggregator.wait_drained().await;
        assert_eq!(aggregator.pending(), 0);
        assert_eq!(aggregator.total_count(), 1000);

        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_push_after_consumer_stopped() {
        let aggregator = Arc::new(Aggregator::new(BucketLayout::Standard));
        let (sink, receiver) = aggregator.channel(1);
        drop(receiver);
        assert!(sink.push(sample_with(1, 200)).await.is_err());
        assert_eq!(aggregator.pending(), 0);
    }
}
