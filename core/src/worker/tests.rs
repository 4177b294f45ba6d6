//! Integration tests for the Worker module

use super::*;
use crate::config::PacingMode;
use crate::error::Error;
use crate::pool::ResultAggregator;
use crate::response::Reply;
use crate::traits::{RequestSender, TransportError};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock RequestSender
// ============================================================================

struct MockSender {
    status: u16,
    delay: Option<Duration>,
    fail_every: Option<usize>,
    counter: AtomicUsize,
}

impl MockSender {
    fn new(status: u16) -> Self {
        Self {
            status,
            delay: None,
            fail_every: None,
            counter: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    fn calls(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestSender for MockSender {
    fn target(&self) -> &str {
        "mock://target"
    }

    async fn send(&self) -> Result<Reply, TransportError> {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(fail_every) = self.fail_every {
            if count % fail_every == fail_every - 1 {
                return Err(TransportError::Build("simulated failure".to_string()));
            }
        }

        Ok(Reply::new(self.status, "mock body"))
    }
}

// ============================================================================
// Helper functions
// ============================================================================

const PERIOD: Duration = Duration::from_millis(100);
const RUN: Duration = Duration::from_secs(1);

fn create_test_worker(
    id: usize,
    sender: Arc<dyn RequestSender>,
    pacer: &Pacer,
    deadline: Instant,
    request_timeout: Duration,
    aggregator: Arc<ResultAggregator>,
) -> Worker {
    WorkerBuilder::new(id)
        .sender(sender)
        .ticker(pacer.ticker())
        .deadline(deadline)
        .request_timeout(request_timeout)
        .aggregator(aggregator)
        .build()
        .expect("Failed to build worker")
}

async fn run_single(sender: Arc<MockSender>, request_timeout: Duration) -> (WorkerStats, Arc<ResultAggregator>) {
    let start = Instant::now();
    let pacer = Pacer::new(PacingMode::PerWorker, PERIOD, start);
    let aggregator = Arc::new(ResultAggregator::new());

    let worker = create_test_worker(
        0,
        sender,
        &pacer,
        start + RUN,
        request_timeout,
        Arc::clone(&aggregator),
    );

    let stats = worker.run(CancellationToken::new()).await;
    (stats, aggregator)
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_worker_runs_until_deadline() {
    let sender = Arc::new(MockSender::new(200));
    let (stats, aggregator) = run_single(Arc::clone(&sender), Duration::from_secs(10)).await;

    // Ticks at 100ms..=900ms; the tick at 1s coincides with the deadline
    assert_eq!(stats.dispatched, 9);
    assert_eq!(stats.success, 9);
    assert_eq!(sender.calls(), 9);

    let summary = aggregator.summarize();
    assert_eq!(summary.success, 9);
    assert_eq!(summary.total, 9);
}

#[tokio::test(start_paused = true)]
async fn test_worker_counts_rate_limited_separately() {
    let (stats, aggregator) = run_single(Arc::new(MockSender::new(429)), Duration::from_secs(10)).await;

    assert_eq!(stats.rate_limited, stats.dispatched);
    assert_eq!(stats.success, 0);
    assert_eq!(stats.errors, 0);
    assert_eq!(aggregator.summarize().rate_limited, stats.dispatched as u64);
}

#[tokio::test(start_paused = true)]
async fn test_worker_unexpected_status_is_error() {
    let (stats, _aggregator) = run_single(Arc::new(MockSender::new(503)), Duration::from_secs(10)).await;

    assert!(stats.dispatched > 0);
    assert_eq!(stats.errors, stats.dispatched);
}

#[tokio::test(start_paused = true)]
async fn test_worker_continues_after_transport_errors() {
    let sender = Arc::new(MockSender::new(200).with_fail_every(3));
    let (stats, aggregator) = run_single(sender, Duration::from_secs(10)).await;

    assert_eq!(stats.dispatched, 9);
    assert_eq!(stats.errors, 3);
    assert_eq!(stats.success, 6);
    assert_eq!(aggregator.summarize().total, 9);
}

#[tokio::test(start_paused = true)]
async fn test_worker_request_timeout_is_error() {
    let sender = Arc::new(MockSender::new(200).with_delay(Duration::from_secs(5)));
    let (stats, _aggregator) = run_single(sender, Duration::from_millis(200)).await;

    assert!(stats.dispatched >= 1);
    assert_eq!(stats.success, 0);
    assert_eq!(stats.errors, stats.dispatched);
}

#[tokio::test(start_paused = true)]
async fn test_worker_finishes_in_flight_request_at_deadline() {
    let sender = Arc::new(MockSender::new(200).with_delay(Duration::from_millis(500)));
    let (stats, aggregator) = run_single(sender, Duration::from_secs(10)).await;

    // Every dispatched request got an outcome, including the one that
    // straddled the deadline
    assert!(stats.dispatched >= 2);
    assert_eq!(stats.completed(), stats.dispatched);
    assert_eq!(aggregator.summarize().total, stats.dispatched as u64);
    assert!(stats.elapsed().unwrap() > RUN);
}

#[tokio::test(start_paused = true)]
async fn test_worker_cancel_drops_in_flight_request() {
    let start = Instant::now();
    let pacer = Pacer::new(PacingMode::PerWorker, PERIOD, start);
    let aggregator = Arc::new(ResultAggregator::new());
    let sender = Arc::new(MockSender::new(200).with_delay(Duration::from_secs(30)));

    let worker = create_test_worker(
        0,
        sender,
        &pacer,
        start + Duration::from_secs(60),
        Duration::from_secs(60),
        Arc::clone(&aggregator),
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(worker.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(250)).await;
    cancel.cancel();

    let stats = handle.await.expect("Worker task panicked");

    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.completed(), 0);
    assert_eq!(aggregator.summarize().total, 0);
    assert!(stats.elapsed().unwrap() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_worker_pre_cancelled_sends_nothing() {
    let start = Instant::now();
    let pacer = Pacer::new(PacingMode::PerWorker, PERIOD, start);
    let sender = Arc::new(MockSender::new(200));

    let worker = create_test_worker(
        0,
        Arc::clone(&sender) as Arc<dyn RequestSender>,
        &pacer,
        start + RUN,
        Duration::from_secs(1),
        Arc::new(ResultAggregator::new()),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = worker.run(cancel).await;

    assert_eq!(stats.dispatched, 0);
    assert_eq!(sender.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_workers_share_aggregate_ticker() {
    let start = Instant::now();
    let pacer = Pacer::new(PacingMode::Aggregate, PERIOD, start);
    let aggregator = Arc::new(ResultAggregator::new());
    let sender: Arc<dyn RequestSender> = Arc::new(MockSender::new(200));

    let handles: Vec<_> = (0..3)
        .map(|id| {
            let worker = create_test_worker(
                id,
                Arc::clone(&sender),
                &pacer,
                start + RUN,
                Duration::from_secs(10),
                Arc::clone(&aggregator),
            );
            tokio::spawn(worker.run(CancellationToken::new()))
        })
        .collect();

    let mut dispatched = 0;
    for handle in handles {
        dispatched += handle.await.unwrap().dispatched;
    }

    // Three workers split one tick stream
    assert_eq!(dispatched, 9);
    assert_eq!(aggregator.summarize().total, 9);
}

#[test]
fn test_worker_builder_missing_fields() {
    let err = WorkerBuilder::new(0).build().unwrap_err();
    assert!(matches!(err, Error::MissingConfig("sender")));

    let err = WorkerBuilder::new(0)
        .sender(Arc::new(MockSender::new(200)))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfig("ticker")));
}

#[tokio::test]
async fn test_worker_debug_format() {
    let pacer = Pacer::new(PacingMode::PerWorker, PERIOD, Instant::now());
    let worker = create_test_worker(
        7,
        Arc::new(MockSender::new(200)),
        &pacer,
        Instant::now() + RUN,
        Duration::from_secs(1),
        Arc::new(ResultAggregator::new()),
    );

    assert_eq!(worker.id(), 7);
    let debug = format!("{:?}", worker);
    assert!(debug.contains("mock://target"));
}
