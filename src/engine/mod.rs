//! Request engine abstraction
//!
//! A request engine is the single primitive a worker needs: given a request
//! description, perform it and report the HTTP status. Workers take their own
//! timestamps around the call, so engines only deal with transport.
//!
//! # Engine Types
//!
//! - **HTTP**: real requests over `reqwest` with a shared connection pool
//! - **Mock**: deterministic latency, status and failure schedule for tests
//!
//! # Example
//!
//! ```no_run
//! use reqpulse::config::RequestConfig;
//! use reqpulse::engine::{http::HttpEngine, RequestExecutor, RequestSpec};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut config = RequestConfig::default();
//! config.url = Some("http://127.0.0.1:8080/".to_string());
//!
//! let engine = HttpEngine::new(&config, 4)?;
//! let request = RequestSpec::from_config(&config)?;
//! let status = engine.execute(&request).await?;
//! println!("status {}", status);
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod mock;

use crate::config::workload::{Header, HttpMethod};
use crate::config::RequestConfig;
use crate::error::ConfigError;
use crate::Result;
use std::future::Future;
use std::sync::Arc;

/// Request execution primitive
///
/// Implementations are shared by every worker of a run, so they must be
/// `Send + Sync`; the returned future must be `Send` so workers can run on
/// any runtime thread.
///
/// # Errors
///
/// Any transport failure (connect, TLS, timeout, body read) is returned as an
/// error. Callers record it as a failed request; it never ends the run.
pub trait RequestExecutor: Send + Sync + 'static {
    /// Perform one request and return its HTTP status code
    fn execute(&self, request: &RequestSpec) -> impl Future<Output = Result<u16>> + Send;
}

/// Everything needed to issue one request
///
/// Built once per run and shared read-only by all workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub body: Option<String>,
    payload: Arc<str>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        let url = url.into();
        let payload = Arc::from(format!("{} {}", method, url));
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            payload,
        }
    }

    pub fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// Build the request from the `[request]` configuration section
    pub fn from_config(config: &RequestConfig) -> std::result::Result<Self, ConfigError> {
        let url = config.url.as_deref().ok_or(ConfigError::MissingTarget)?;
        Ok(Self::new(config.method, url.trim())
            .with_headers(config.headers.clone())
            .with_body(config.body.clone()))
    }

    /// Short description attached to every sample ("METHOD url")
    pub fn payload(&self) -> Arc<str> {
        Arc::clone(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload() {
        let spec = RequestSpec::new(HttpMethod::Post, "http://localhost/submit");
        assert_eq!(&*spec.payload(), "POST http://localhost/submit");
    }

    #[test]
    fn test_from_config() {
        let mut config = RequestConfig::default();
        config.url = Some(" http://localhost:9000/ ".to_string());
        config.body = Some("ping".to_string());
        config.headers.push(Header {
            name: "X-Trace".to_string(),
            value: "1".to_string(),
        });

        let spec = RequestSpec::from_config(&config).unwrap();
        assert_eq!(spec.method, HttpMethod::Get);
        assert_eq!(spec.url, "http://localhost:9000/");
        assert_eq!(spec.body.as_deref(), Some("ping"));
        assert_eq!(spec.headers.len(), 1);
    }

    #[test]
    fn test_from_config_missing_url() {
        let config = RequestConfig::default();
        assert_eq!(RequestSpec::from_config(&config), Err(ConfigError::MissingTarget));
    }
}
