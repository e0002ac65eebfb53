//! Run coordinator
//!
//! The coordinator owns one run from start to report:
//!
//! - spawns one task per worker and one aggregator consumer task
//! - optionally holds the start gate until every worker is parked (pre-heat)
//! - opens the gate and races natural completion, the time limit and an
//!   external interrupt, printing progress lines on a fixed interval
//! - on the first trigger stops new requests, lets in-flight ones finish
//!   within the shutdown grace period, and finalizes the statistics once
//!
//! # Example
//!
//! ```no_run
//! use reqpulse::config::Config;
//! use reqpulse::engine::http::HttpEngine;
//! use reqpulse::Coordinator;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(config: Config) -> anyhow::Result<()> {
//! let engine = HttpEngine::new(&config.request, config.workload.concurrency)?;
//! let coordinator = Coordinator::new(config, engine)?;
//! let outcome = coordinator.run(CancellationToken::new()).await?;
//! println!("{} requests", outcome.statistics.total_count());
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::engine::{RequestExecutor, RequestSpec};
use crate::error::ConfigError;
use crate::stats::live::ProgressReporter;
use crate::stats::{Aggregator, ReportBuilder, RunWindow, Statistics};
use crate::util::time::format_wall_clock;
use crate::worker::{StartGate, Worker};
use crate::Result;
use anyhow::Context;
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    WaitingForWorkers,
    Running,
    Finalizing,
    Done,
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every worker used up its request quota
    Completed,
    /// The time limit elapsed
    Deadline,
    /// The interrupt token was cancelled
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::Deadline => write!(f, "time limit reached"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Final statistics plus the trigger that ended the run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub statistics: Statistics,
    pub reason: StopReason,
    /// When the start gate opened; `None` if the run ended before it did
    pub released_at: Option<Instant>,
}

/// Drives a single load run
pub struct Coordinator<E: RequestExecutor> {
    config: Arc<Config>,
    executor: Arc<E>,
    request: Arc<RequestSpec>,
    phase: watch::Sender<RunPhase>,
}

impl<E: RequestExecutor> Coordinator<E> {
    /// Create a coordinator for a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingTarget` if no URL is configured.
    pub fn new(config: Config, executor: E) -> std::result::Result<Self, ConfigError> {
        let request = RequestSpec::from_config(&config.request)?;
        let (phase, _) = watch::channel(RunPhase::Idle);
        Ok(Self {
            config: Arc::new(config),
            executor: Arc::new(executor),
            request: Arc::new(request),
            phase,
        })
    }

    /// Current phase
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// Receiver that observes every phase change
    pub fn watch_phase(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: RunPhase) {
        debug!(?phase, "run phase");
        self.phase.send_replace(phase);
    }

    /// Execute the run
    ///
    /// `interrupt` is the external stop signal (Ctrl+C in the binary).
    /// Cancelling it ends the run early with a report of whatever completed.
    pub async fn run(&self, interrupt: CancellationToken) -> Result<RunOutcome> {
        let workload = &self.config.workload;
        let concurrency = workload.concurrency.max(1);

        let aggregator = Arc::new(Aggregator::new(workload.buckets));
        let report = ReportBuilder::new();
        let (sink, receiver) = aggregator.channel(concurrency);
        let consumer = tokio::spawn(Arc::clone(&aggregator).consume(receiver));

        let gate = Arc::new(StartGate::new(concurrency));
        let stop = interrupt.child_token();
        let limit = workload.completion_mode.and_then(|mode| mode.requests_per_worker());

        let mut workers = JoinSet::new();
        let mut counters = Vec::with_capacity(concurrency);
        for id in 0..concurrency {
            let worker = Worker::new(
                id,
                Arc::clone(&self.executor),
                Arc::clone(&self.request),
                sink.clone(),
                Arc::clone(&gate),
                stop.clone(),
            )
            .with_limit(limit)
            .with_sleep_interval(workload.sleep_interval());
            counters.push(worker.counters());
            workers.spawn(worker.run());
        }
        drop(sink);
        debug!(concurrency, ?limit, "workers spawned");

        if workload.pre_heat {
            self.set_phase(RunPhase::WaitingForWorkers);
            let interrupted = tokio::select! {
                biased;
                _ = interrupt.cancelled() => true,
                _ = gate.wait_all_ready() => false,
            };
            if interrupted {
                info!("interrupted before start");
                let window = RunWindow::empty(Local::now());
                self.shutdown(&stop, &mut workers).await;
                return self
                    .finish(&report, &aggregator, consumer, window, StopReason::Interrupted, None)
                    .await;
            }
            debug!(ready = gate.ready_count(), "all workers ready");
        }

        let started_at = Local::now();
        let run_start = Instant::now();
        gate.open();
        self.set_phase(RunPhase::Running);
        println!("Starting at: {}", format_wall_clock(&started_at));

        let deadline = workload.completion_mode.and_then(|mode| mode.time_limit());
        let deadline_timer = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_timer);

        let live = !self.config.output.no_live;
        let interval = self.config.output.print_interval();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut progress = ProgressReporter::new(counters, interval);

        let reason = loop {
            tokio::select! {
                biased;
                _ = interrupt.cancelled() => break StopReason::Interrupted,
                _ = &mut deadline_timer => break StopReason::Deadline,
                joined = workers.join_next() => match joined {
                    None => break StopReason::Completed,
                    Some(Err(e)) => warn!(error = %e, "worker task failed"),
                    Some(Ok(_)) => {}
                },
                _ = ticker.tick(), if live => progress.display_console(),
            }
        };

        let elapsed = run_start.elapsed();
        let window = RunWindow::new(started_at, Local::now(), elapsed);
        info!(%reason, elapsed_ms = elapsed.as_millis() as u64, "run ended");

        self.shutdown(&stop, &mut workers).await;
        self.finish(&report, &aggregator, consumer, window, reason, Some(run_start))
            .await
    }

    /// Stop new requests and wait for workers within the grace period
    async fn shutdown(&self, stop: &CancellationToken, workers: &mut JoinSet<u64>) {
        stop.cancel();
        if workers.is_empty() {
            return;
        }

        let grace = self.config.runtime.shutdown_grace();
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "worker task failed");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = workers.len(),
                grace_secs = grace.as_secs(),
                "in-flight requests exceeded shutdown grace period, aborting"
            );
            workers.shutdown().await;
        }
    }

    async fn finish(
        &self,
        report: &ReportBuilder,
        aggregator: &Aggregator,
        consumer: JoinHandle<()>,
        window: RunWindow,
        reason: StopReason,
        released_at: Option<Instant>,
    ) -> Result<RunOutcome> {
        self.set_phase(RunPhase::Finalizing);

        let statistics = report
            .finalize(aggregator, window)
            .await
            .context("run statistics were already finalized")?;
        consumer.await.context("aggregator task failed")?;

        self.set_phase(RunPhase::Done);
        Ok(RunOutcome {
            statistics,
            reason,
            released_at,
        })
    }
}
