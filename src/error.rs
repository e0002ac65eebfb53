//! Configuration error taxonomy
//!
//! Request-level failures never surface as errors (they become failed samples),
//! and runtime plumbing uses `anyhow`. Configuration problems are the one class
//! of error a user must see before any worker starts, so they get a typed enum
//! the binary can match on to print usage and exit non-zero.

use thiserror::Error;

/// Errors detected while building or validating a run configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("You need to set url")]
    MissingTarget,

    #[error("invalid target url '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("You need to set concurrency >= 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("You need to set request count or time limit")]
    NoCompletionLimit,

    #[error("the method [{0}] is wrong")]
    UnknownMethod(String),

    #[error("invalid header '{0}', expected 'Name: value'")]
    InvalidHeader(String),

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("invalid proxy '{0}'")]
    InvalidProxy(String),

    #[error("failed to load config file {path}: {reason}")]
    ConfigFile { path: String, reason: String },
}
