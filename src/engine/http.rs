//! HTTP request engine
//!
//! One `reqwest::Client` is shared by all workers of a run. The idle pool is
//! sized to the worker count so every worker can keep a warm connection.
//! Certificate verification is off unless `verify_tls` is set.

use super::{RequestExecutor, RequestSpec};
use crate::config::RequestConfig;
use crate::Result;
use anyhow::Context;
use reqwest::{Client, Method, Proxy};
use tracing::debug;

/// reqwest-backed request engine
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
}

impl HttpEngine {
    /// Build the shared client
    ///
    /// # Arguments
    ///
    /// * `config` - Request section (timeout, proxy, TLS verification)
    /// * `concurrency` - Number of workers that will share the client
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is rejected or the TLS backend
    /// cannot be initialised.
    pub fn new(config: &RequestConfig, concurrency: usize) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(concurrency.max(1))
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls);

        if let Some(ref proxy) = config.proxy {
            let proxy = Proxy::all(proxy.as_str())
                .with_context(|| format!("Invalid proxy: {}", proxy))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        debug!(concurrency, timeout_secs = config.timeout_secs, "HTTP client ready");

        Ok(Self { client })
    }
}

impl RequestExecutor for HttpEngine {
    async fn execute(&self, request: &RequestSpec) -> Result<u16> {
        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .with_context(|| format!("Unsupported method: {}", request.method))?;

        let mut builder = self.client.request(method, request.url.as_str());
        for header in &request.headers {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        // Drain the body so the connection returns to the pool
        response.bytes().await?;

        Ok(status)
    }
}
