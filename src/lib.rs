//! reqpulse - Concurrent HTTP load generator
//!
//! reqpulse drives many simultaneous request-sending workers against a single
//! HTTP endpoint, measures a timing breakdown for every request, and folds the
//! measurements into a coarse latency histogram and a final report.
//!
//! # Architecture
//!
//! - **Workers**: one tokio task per simulated client, released together by a start gate
//! - **Aggregator**: single consumer that buckets samples by response time
//! - **Report builder**: exactly-once merge of all buckets into final statistics
//! - **Coordinator**: races completion, deadline and interrupt, prints progress
//! - **Engines**: pluggable request execution (HTTP via reqwest, mock for tests)

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod output;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::Coordinator;
pub use engine::RequestExecutor;
pub use error::ConfigError;

/// Result type used throughout reqpulse
pub type Result<T> = anyhow::Result<T>;
