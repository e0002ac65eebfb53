//! Start gate
//!
//! Every worker parks on the gate before sending its first request. The
//! coordinator can wait until all of them have arrived (pre-heat) and then
//! release them together with one broadcast.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{watch, Notify};

/// One-shot broadcast barrier
#[derive(Debug)]
pub struct StartGate {
    expected: usize,
    ready: AtomicUsize,
    all_ready: Notify,
    open: watch::Sender<bool>,
}

impl StartGate {
    /// Create a closed gate for `expected` workers
    pub fn new(expected: usize) -> Self {
        let (open, _) = watch::channel(false);
        Self {
            expected,
            ready: AtomicUsize::new(0),
            all_ready: Notify::new(),
            open,
        }
    }

    /// Announce arrival and wait until the gate opens
    pub async fn wait(&self) {
        let mut open = self.open.subscribe();
        let arrived = self.ready.fetch_add(1, Ordering::AcqRel) + 1;
        if arrived == self.expected {
            self.all_ready.notify_one();
        }
        // The sender lives as long as `self`, so this only returns once open
        let _ = open.wait_for(|is_open| *is_open).await;
    }

    /// Wait until every expected worker is parked on the gate
    pub async fn wait_all_ready(&self) {
        while self.ready_count() < self.expected {
            self.all_ready.notified().await;
        }
    }

    /// Release every waiting worker, and any that arrive later
    pub fn open(&self) {
        self.open.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Workers that have reached the gate so far
    pub fn ready_count(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }
}
