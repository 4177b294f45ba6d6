//! Builder pattern for Worker construction

use crate::error::{Error, Result};
use crate::pool::ResultAggregator;
use crate::traits::RequestSender;

use super::executor::Worker;
use super::pacer::Ticker;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .sender(sender)
///     .ticker(pacer.ticker())
///     .deadline(start + duration)
///     .request_timeout(Duration::from_secs(10))
///     .aggregator(aggregator)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    sender: Option<Arc<dyn RequestSender>>,
    ticker: Option<Ticker>,
    deadline: Option<Instant>,
    request_timeout: Option<Duration>,
    aggregator: Option<Arc<ResultAggregator>>,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            sender: None,
            ticker: None,
            deadline: None,
            request_timeout: None,
            aggregator: None,
        }
    }

    /// Set the request sender
    pub fn sender(mut self, sender: Arc<dyn RequestSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the pacing ticker
    pub fn ticker(mut self, ticker: Ticker) -> Self {
        self.ticker = Some(ticker);
        self
    }

    /// Set the instant after which no request is started
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the shared outcome counters
    pub fn aggregator(mut self, aggregator: Arc<ResultAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> Result<Worker> {
        let sender = self.sender.ok_or(Error::missing_config("sender"))?;
        let ticker = self.ticker.ok_or(Error::missing_config("ticker"))?;
        let deadline = self.deadline.ok_or(Error::missing_config("deadline"))?;
        let request_timeout = self
            .request_timeout
            .ok_or(Error::missing_config("request_timeout"))?;
        let aggregator = self
            .aggregator
            .ok_or(Error::missing_config("aggregator"))?;

        Ok(Worker::new(
            self.id,
            sender,
            ticker,
            deadline,
            request_timeout,
            aggregator,
        ))
    }
}
