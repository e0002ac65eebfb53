//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;
pub mod workload;

use crate::stats::BucketLayout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use workload::*;

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// How many clients run, for how long, and how results are bucketed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Completion criteria (request quota or deadline)
    #[serde(default)]
    pub completion_mode: Option<CompletionMode>,
    /// Hold the start gate until every worker is ready
    #[serde(default)]
    pub pre_heat: bool,
    /// Think time between requests of one worker (milliseconds)
    #[serde(default)]
    pub sleep_interval_ms: u64,
    /// Latency range table
    #[serde(default)]
    pub buckets: BucketLayout,
}

fn default_concurrency() -> usize {
    1
}

impl WorkloadConfig {
    pub fn sleep_interval(&self) -> Option<Duration> {
        (self.sleep_interval_ms > 0).then(|| Duration::from_millis(self.sleep_interval_ms))
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            completion_mode: None,
            pre_heat: false,
            sleep_interval_ms: 0,
            buckets: BucketLayout::default(),
        }
    }
}

/// Request every worker sends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Target URL
    pub url: Option<String>,
    /// Extra headers
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Request body
    pub body: Option<String>,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Verify server certificates
    #[serde(default)]
    pub verify_tls: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: HttpMethod::default(),
            url: None,
            headers: Vec::new(),
            body: None,
            proxy: None,
            timeout_secs: default_timeout_secs(),
            verify_tls: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Progress line interval (seconds)
    #[serde(default = "default_print_interval")]
    pub print_interval_secs: u64,
    /// Disable progress lines
    #[serde(default)]
    pub no_live: bool,
    /// JSON report file path
    pub json_output: Option<PathBuf>,
}

fn default_print_interval() -> u64 {
    1
}

impl OutputConfig {
    pub fn print_interval(&self) -> Duration {
        Duration::from_secs(self.print_interval_secs.max(1))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            print_interval_secs: default_print_interval(),
            no_live: false,
            json_output: None,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
    /// Dry run mode
    #[serde(default)]
    pub dry_run: bool,
    /// How long in-flight requests may run after the stop signal (seconds)
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_shutdown_grace() -> u64 {
    10
}

impl RuntimeConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            dry_run: false,
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

// Display trait implementations

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Workload: {}", self.workload)?;
        writeln!(f, "  Request: {}", self.request)?;
        writeln!(f, "  Output: {}", self.output)?;
        writeln!(f, "  Runtime: {}", self.runtime)?;
        Ok(())
    }
}

impl fmt::Display for WorkloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "concurrency={}", self.concurrency)?;
        match self.completion_mode {
            Some(mode) => write!(f, ", completion={}", mode)?,
            None => write!(f, ", completion=unset")?,
        }
        write!(f, ", buckets={}", self.buckets)?;
        if self.pre_heat {
            write!(f, ", pre_heat")?;
        }
        if self.sleep_interval_ms > 0 {
            write!(f, ", sleep={}ms", self.sleep_interval_ms)?;
        }
        Ok(())
    }
}

impl fmt::Display for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, timeout={}s",
            self.method,
            self.url.as_deref().unwrap_or("<unset>"),
            self.timeout_secs
        )?;
        if !self.headers.is_empty() {
            write!(f, ", headers={}", self.headers.len())?;
        }
        if let Some(ref body) = self.body {
            write!(f, ", body={} bytes", body.len())?;
        }
        if let Some(ref proxy) = self.proxy {
            write!(f, ", proxy={}", proxy)?;
        }
        if self.verify_tls {
            write!(f, ", verify_tls")?;
        }
        Ok(())
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.no_live {
            write!(f, "live=off")?;
        } else {
            write!(f, "live every {}s", self.print_interval_secs)?;
        }
        if let Some(ref path) = self.json_output {
            write!(f, ", json={}", path.display())?;
        }
        Ok(())
    }
}

impl fmt::Display for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shutdown_grace={}s", self.shutdown_grace_secs)?;
        if self.debug {
            write!(f, ", debug")?;
        }
        if self.dry_run {
            write!(f, ", dry_run")?;
        }
        Ok(())
    }
}
