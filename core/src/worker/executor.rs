//! Worker execution loop

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::pool::ResultAggregator;
use crate::response::Outcome;
use crate::traits::RequestSender;

use super::pacer::Ticker;
use super::stats::WorkerStats;

/// Worker executes requests in a loop: tick -> check deadline -> send -> record
///
/// Workers are tokio tasks spawned by the pool. They share the sender and the
/// aggregator via `Arc`; pacing comes from their [`Ticker`].
pub struct Worker {
    /// Unique worker identifier
    id: usize,

    /// Request sender (shared across workers)
    sender: Arc<dyn RequestSender>,

    /// Pacing schedule
    ticker: Ticker,

    /// No request is started at or after this instant
    deadline: Instant,

    /// Upper bound on a single request
    request_timeout: Duration,

    /// Run-wide outcome counters
    aggregator: Arc<ResultAggregator>,
}

impl Worker {
    /// Create a new worker
    ///
    /// Use [`WorkerBuilder`](super::WorkerBuilder) for a more ergonomic
    /// construction.
    pub fn new(
        id: usize,
        sender: Arc<dyn RequestSender>,
        ticker: Ticker,
        deadline: Instant,
        request_timeout: Duration,
        aggregator: Arc<ResultAggregator>,
    ) -> Self {
        Self {
            id,
            sender,
            ticker,
            deadline,
            request_timeout,
            aggregator,
        }
    }

    /// Run the worker loop
    ///
    /// Returns when the deadline passes or `cancel` fires. Cancellation drops
    /// an in-flight request; the deadline lets it finish.
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(worker_id = self.id, url = self.sender.target(), "Worker started");

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::debug!(worker_id = self.id, "Worker received shutdown signal");
                    break;
                }

                next = self.next_request(&mut stats) => match next {
                    Some(outcome) => {
                        stats.record(outcome);
                        self.aggregator.record(outcome);
                    }
                    None => {
                        tracing::debug!(worker_id = self.id, "Worker reached deadline");
                        break;
                    }
                }
            }
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            dispatched = stats.dispatched,
            success = stats.success,
            rate_limited = stats.rate_limited,
            errors = stats.errors,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        stats
    }

    /// Wait for a tick and send one request, or `None` once the deadline has
    /// passed
    async fn next_request(&mut self, stats: &mut WorkerStats) -> Option<Outcome> {
        tokio::select! {
            _ = self.ticker.tick() => {}
            () = tokio::time::sleep_until(self.deadline) => return None,
        }

        if Instant::now() >= self.deadline {
            return None;
        }

        stats.dispatched += 1;
        Some(self.dispatch().await)
    }

    /// Send one request and classify the result
    async fn dispatch(&self) -> Outcome {
        let reply = match tokio::time::timeout(self.request_timeout, self.sender.send()).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(worker_id = self.id, error = %e, "Request failed");
                return Outcome::Error;
            }
            Err(_) => {
                tracing::warn!(
                    worker_id = self.id,
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "Request timed out"
                );
                return Outcome::Error;
            }
        };

        let outcome = reply.outcome();
        match outcome {
            Outcome::Success => {
                tracing::debug!(worker_id = self.id, status = reply.status, body = %reply.body, "Request admitted");
            }
            Outcome::RateLimited => {
                tracing::debug!(worker_id = self.id, status = reply.status, "Request rate limited");
            }
            Outcome::Error => {
                tracing::warn!(
                    worker_id = self.id,
                    status = reply.status,
                    body = %reply.body,
                    "Unexpected response status"
                );
            }
        }
        outcome
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("target", &self.sender.target())
            .field("ticker", &self.ticker)
            .field("deadline", &self.deadline)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
