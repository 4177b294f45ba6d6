//! Worker statistics tracking

use std::time::Duration;

use tokio::time::Instant;

use crate::response::Outcome;

/// Statistics tracked by each worker
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Requests issued (a request cut short by cancellation is counted here
    /// but has no outcome)
    pub dispatched: usize,

    /// Requests answered `200`
    pub success: usize,

    /// Requests answered `429`
    pub rate_limited: usize,

    /// Transport failures, timeouts and unexpected statuses
    pub errors: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Count one classified request
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::RateLimited => self.rate_limited += 1,
            Outcome::Error => self.errors += 1,
        }
    }

    /// Requests with a recorded outcome
    pub fn completed(&self) -> usize {
        self.success + self.rate_limited + self.errors
    }

    /// Fraction of completed requests that were admitted (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.0,
            n => self.success as f64 / n as f64,
        }
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Completed requests per second of worker lifetime
    pub fn requests_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| d.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .map(|secs| self.completed() as f64 / secs)
            .unwrap_or(0.0)
    }

    /// Merge counts from another worker
    pub fn merge(&mut self, other: &WorkerStats) {
        self.dispatched += other.dispatched;
        self.success += other.success;
        self.rate_limited += other.rate_limited;
        self.errors += other.errors;
    }
}
