//! HTTP request sender backed by reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::config::LoadRunConfig;
use crate::response::Reply;
use crate::traits::{RequestSender, TransportError};

/// Issues `GET` requests against a fixed URL
///
/// One client is shared by every worker so connections are pooled. The
/// client-level timeout covers connect, send and body read.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpSender {
    /// Build a sender for the run's target URL and request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client cannot
    /// be built.
    pub fn new(config: &LoadRunConfig) -> Result<Self, TransportError> {
        let url = Url::parse(&config.target_url)
            .map_err(|e| TransportError::Build(format!("{}: {e}", config.target_url)))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.concurrency)
            .user_agent(concat!("ratelimit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url,
            timeout: config.request_timeout,
        })
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else {
            TransportError::Http(err)
        }
    }
}

#[async_trait]
impl RequestSender for HttpSender {
    fn target(&self) -> &str {
        self.url.as_str()
    }

    async fn send(&self) -> Result<Reply, TransportError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();

        // Outcome depends on status only; an unreadable body is dropped
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status, error = %e, "Failed to read response body");
                String::new()
            }
        };

        Ok(Reply::new(status, body))
    }
}
