//! Load run execution logic

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::LoadRunConfig;
use crate::error::{Error, Result};
use crate::shutdown::shutdown_signal;
use crate::traits::RequestSender;
use crate::worker::{Pacer, WorkerBuilder};

use super::aggregator::{ResultAggregator, RunReport};

/// Drives `concurrency` workers against one target until the run's duration
/// elapses or it is cancelled
///
/// The cancellation token is fired at most once per pool; a cancelled pool
/// returns immediately from every later run.
pub struct LoadWorkerPool {
    /// Run configuration (validated by the builder)
    pub(crate) config: LoadRunConfig,

    /// Request sender (shared across workers)
    pub(crate) sender: Arc<dyn RequestSender>,

    /// Outcome counters of the latest run, replaced at the start of each run
    pub(crate) aggregator: Mutex<Arc<ResultAggregator>>,

    /// Stops every worker when cancelled
    pub(crate) cancel: CancellationToken,
}

impl LoadWorkerPool {
    /// Create a new pool
    ///
    /// `config` must already be validated; outside the crate the pool is
    /// built through [`LoadWorkerPoolBuilder`](super::LoadWorkerPoolBuilder).
    pub(crate) fn new(config: LoadRunConfig, sender: Arc<dyn RequestSender>) -> Self {
        Self {
            config,
            sender,
            aggregator: Mutex::new(Arc::new(ResultAggregator::new())),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop all workers; in-flight requests are dropped
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Get the run configuration
    pub fn config(&self) -> &LoadRunConfig {
        &self.config
    }

    /// Outcome counters of the current or most recent run
    pub fn aggregator(&self) -> Arc<ResultAggregator> {
        Arc::clone(&self.aggregator.lock())
    }

    /// Run the load test
    ///
    /// Spawns the workers, waits until every one has returned, then
    /// summarizes. Individual request failures never fail the run. Each run
    /// counts into fresh counters, so the report covers this run only.
    ///
    /// # Errors
    /// Returns an error if every worker panicked.
    pub async fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.config.duration)
            .ok_or_else(|| Error::orchestration("run duration overflows the clock"))?;
        let pacer = Pacer::new(self.config.pacing, self.config.tick_interval(), start);

        let aggregator = Arc::new(ResultAggregator::new());
        *self.aggregator.lock() = Arc::clone(&aggregator);

        tracing::info!(
            target_url = %self.config.target_url,
            concurrency = self.config.concurrency,
            duration_secs = self.config.duration.as_secs_f64(),
            target_rate = self.config.target_rate,
            pacing = %self.config.pacing,
            "Starting load run"
        );

        let mut handles = Vec::with_capacity(self.config.concurrency);
        for worker_id in 0..self.config.concurrency {
            let worker = WorkerBuilder::new(worker_id)
                .sender(Arc::clone(&self.sender))
                .ticker(pacer.ticker())
                .deadline(deadline)
                .request_timeout(self.config.request_timeout)
                .aggregator(Arc::clone(&aggregator))
                .build()?;

            handles.push(tokio::spawn(worker.run(self.cancel.clone())));
        }

        let mut finished = 0;
        let mut worker_failures = 0;
        for (idx, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(stats) => {
                    tracing::debug!(
                        worker_id = idx,
                        dispatched = stats.dispatched,
                        success = stats.success,
                        rate_limited = stats.rate_limited,
                        errors = stats.errors,
                        "Worker completed"
                    );
                    finished += 1;
                }
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker task panicked");
                }
            }
        }

        if finished == 0 && worker_failures > 0 {
            return Err(Error::orchestration(format!(
                "All {} workers panicked",
                worker_failures
            )));
        }

        let report = RunReport {
            summary: aggregator.summarize(),
            elapsed: start.elapsed(),
            workers: finished,
        };
        tracing::info!(
            elapsed_secs = report.elapsed.as_secs_f64(),
            success = report.summary.success,
            rate_limited = report.summary.rate_limited,
            errors = report.summary.error,
            total = report.summary.total,
            rps = report.requests_per_second(),
            "Load run completed"
        );

        Ok(report)
    }

    /// Run until `stop` resolves, then cancel the workers and wait for them
    pub async fn run_until<F>(&self, stop: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        let run = self.run();
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => return result,
            () = stop => {
                tracing::info!("Stopping load run");
                self.shutdown();
            }
        }

        run.await
    }

    /// Run with Ctrl+C / SIGTERM handling
    pub async fn run_with_signal_handling(&self) -> Result<RunReport> {
        self.run_until(shutdown_signal()).await
    }

    /// Run with an upper bound on wall time
    pub async fn run_with_timeout(&self, timeout: Duration) -> Result<RunReport> {
        self.run_until(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!(timeout_secs = timeout.as_secs_f64(), "Timeout reached");
        })
        .await
    }
}

impl std::fmt::Debug for LoadWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadWorkerPool")
            .field("config", &self.config)
            .field("target", &self.sender.target())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
