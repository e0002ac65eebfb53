//! Configuration validation
//!
//! Everything here runs before any worker starts, so a bad configuration
//! never produces a partial report.

use super::*;
use crate::error::ConfigError;
use reqwest::Url;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_workload(&config.workload)?;
    validate_request(&config.request)?;
    Ok(())
}

/// Validate workload configuration
pub fn validate_workload(workload: &WorkloadConfig) -> Result<(), ConfigError> {
    if workload.concurrency == 0 {
        return Err(ConfigError::InvalidConcurrency(workload.concurrency));
    }

    match workload.completion_mode {
        None
        | Some(CompletionMode::Requests { per_worker: 0 })
        | Some(CompletionMode::Duration { seconds: 0 }) => Err(ConfigError::NoCompletionLimit),
        Some(_) => Ok(()),
    }
}

/// Validate request configuration
pub fn validate_request(request: &RequestConfig) -> Result<(), ConfigError> {
    let url = match request.url.as_deref().map(str::trim) {
        None | Some("") => return Err(ConfigError::MissingTarget),
        Some(url) => url,
    };
    validate_target_url(url)?;

    if let Some(ref proxy) = request.proxy {
        reqwest::Proxy::all(proxy.as_str()).map_err(|_| ConfigError::InvalidProxy(proxy.clone()))?;
    }

    Ok(())
}

/// A target must be an absolute http(s) URL with a host
fn validate_target_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTarget {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(())
}
