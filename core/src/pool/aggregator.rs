//! Run-wide outcome counters and the end-of-run summary

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::response::Outcome;

/// Outcome counters shared by every worker in a run
///
/// One atomic per outcome; recording never takes a lock and never loses an
/// increment.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    success: AtomicU64,
    rate_limited: AtomicU64,
    error: AtomicU64,
}

impl ResultAggregator {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome
    pub fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Success => &self.success,
            Outcome::RateLimited => &self.rate_limited,
            Outcome::Error => &self.error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the counters
    ///
    /// Meant to be called once every worker has returned; calling it again
    /// returns the same counts.
    pub fn summarize(&self) -> RunSummary {
        let success = self.success.load(Ordering::Acquire);
        let rate_limited = self.rate_limited.load(Ordering::Acquire);
        let error = self.error.load(Ordering::Acquire);

        RunSummary {
            success,
            rate_limited,
            error,
            total: success + rate_limited + error,
        }
    }
}

/// Final outcome counts of a load run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Requests answered `200`
    pub success: u64,

    /// Requests answered `429`
    pub rate_limited: u64,

    /// Transport failures, timeouts and unexpected statuses
    pub error: u64,

    /// Sum of the three counts
    pub total: u64,
}

impl RunSummary {
    /// Fraction of requests admitted (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Successful requests:   {}", self.success)?;
        writeln!(f, "Failed requests:       {}", self.error)?;
        writeln!(f, "Rate limited requests: {}", self.rate_limited)?;
        write!(f, "Total requests:        {}", self.total)
    }
}

/// Summary of a finished run plus how long it took
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Outcome counts
    pub summary: RunSummary,

    /// Wall time from first spawn to last worker return
    pub elapsed: Duration,

    /// Workers that returned normally
    pub workers: usize,
}

impl RunReport {
    /// Recorded requests per second of wall time
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.summary.total as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Load test completed:")?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f, "Success rate:          {:.1}%", self.summary.success_rate() * 100.0)?;
        write!(
            f,
            "Elapsed:               {:.2}s ({:.1} req/s)",
            self.elapsed.as_secs_f64(),
            self.requests_per_second()
        )
    }
}
