// src/ct_search/client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::CertSource;
use crate::config::EnumConfig;
use crate::stats::StatsCollector;

/// HTTP client for a crt.sh-style certificate search endpoint
pub struct CrtShClient {
    endpoint: Url,
    http_client: reqwest::Client,
    rate_delay: Duration,
    max_retries: u32,
    stats: StatsCollector,
}

impl CrtShClient {
    pub fn new(config: &EnumConfig, stats: StatsCollector) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid CT search endpoint: {}", config.endpoint))?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint,
            http_client,
            rate_delay: config.rate_delay,
            max_retries: config.max_retries.max(1),
            stats,
        })
    }

    /// Search URL for every name ending in `.pattern`
    /// Endpoint: GET {endpoint}?q=%.{pattern}&output=json
    pub fn query_url(&self, pattern: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &format!("%.{}", pattern))
            .append_pair("output", "json");
        url
    }

    /// Single attempt: send, read the whole body, require 200 OK
    async fn attempt(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .context("Request failed")?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        if status != StatusCode::OK {
            anyhow::bail!("HTTP {}", status);
        }

        Ok(body.to_vec())
    }

    /// Query with a fixed delay after every failed attempt and after success
    pub async fn fetch_with_retry(&self, pattern: &str) -> Result<Vec<u8>> {
        let url = self.query_url(pattern);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.stats.increment_requests();

            match self.attempt(&url).await {
                Ok(body) => {
                    debug!("Received {} bytes for {}", body.len(), pattern);
                    tokio::time::sleep(self.rate_delay).await;
                    return Ok(body);
                }
                Err(e) => {
                    self.stats.increment_failed_requests();
                    warn!(
                        "Error querying {} (attempt {}/{}): {:#}",
                        pattern, attempt, self.max_retries, e
                    );

                    tokio::time::sleep(self.rate_delay).await;

                    if attempt >= self.max_retries {
                        return Err(e.context(format!(
                            "Failed after {} attempts",
                            self.max_retries
                        )));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CertSource for CrtShClient {
    async fn fetch(&self, pattern: &str) -> Result<Vec<u8>> {
        self.fetch_with_retry(pattern).await
    }
}
