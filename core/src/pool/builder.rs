//! Builder pattern for LoadWorkerPool construction

use std::sync::Arc;
use std::time::Duration;

use crate::config::{LoadRunConfig, PacingMode};
use crate::error::Result;
use crate::sender::HttpSender;
use crate::traits::RequestSender;

use super::executor::LoadWorkerPool;

/// Builder for creating a LoadWorkerPool with proper configuration
///
/// # Example
///
/// ```no_run
/// use ratelimit_core::LoadWorkerPoolBuilder;
/// use std::time::Duration;
///
/// # async fn demo() -> ratelimit_core::Result<()> {
/// let pool = LoadWorkerPoolBuilder::new()
///     .target_url("http://localhost:8080")
///     .concurrency(5)
///     .duration(Duration::from_secs(30))
///     .target_rate(5.0)
///     .build()?;
///
/// let report = pool.run_with_signal_handling().await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct LoadWorkerPoolBuilder {
    config: LoadRunConfig,
    sender: Option<Arc<dyn RequestSender>>,
}

impl LoadWorkerPoolBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LoadRunConfig::default(),
            sender: None,
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: LoadRunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the target URL
    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.config.target_url = url.into();
        self
    }

    /// Set the number of workers
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set how long the run lasts
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    /// Set the target rate (requests per second)
    pub fn target_rate(mut self, rps: f64) -> Self {
        self.config.target_rate = rps;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set how the target rate is shared between workers
    pub fn pacing(mut self, pacing: PacingMode) -> Self {
        self.config.pacing = pacing;
        self
    }

    /// Use a custom sender instead of HTTP
    pub fn sender(mut self, sender: Arc<dyn RequestSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Build the pool
    ///
    /// Without an explicit sender, an [`HttpSender`] is built for the
    /// configured URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the HTTP client
    /// cannot be built.
    pub fn build(self) -> Result<LoadWorkerPool> {
        self.config.validate()?;

        let sender = match self.sender {
            Some(sender) => sender,
            None => Arc::new(HttpSender::new(&self.config)?),
        };

        Ok(LoadWorkerPool::new(self.config, sender))
    }
}

impl Default for LoadWorkerPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
