//! Request pacing for load workers

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::PacingMode;

/// Hands out [`Ticker`]s that share a start instant and period
///
/// In [`PacingMode::Aggregate`] every ticker drains one shared interval, so
/// each tick releases exactly one worker and the combined rate is one request
/// per period. In [`PacingMode::PerWorker`] each ticker owns an interval and
/// every worker fires once per period.
///
/// The first tick lands one period after `start`, never immediately. Ticks
/// missed while workers are busy are skipped, not bunched.
#[derive(Debug)]
pub struct Pacer {
    mode: PacingMode,
    period: Duration,
    start: Instant,
    shared: Option<Arc<Mutex<Interval>>>,
}

impl Pacer {
    /// Create a pacer; must be called within a tokio runtime
    pub fn new(mode: PacingMode, period: Duration, start: Instant) -> Self {
        let shared = match mode {
            PacingMode::Aggregate => Some(Arc::new(Mutex::new(interval(start, period)))),
            PacingMode::PerWorker => None,
        };

        Self {
            mode,
            period,
            start,
            shared,
        }
    }

    /// Pacing mode
    pub fn mode(&self) -> PacingMode {
        self.mode
    }

    /// Time between ticks
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticker for one worker
    pub fn ticker(&self) -> Ticker {
        match &self.shared {
            Some(shared) => Ticker::Shared(Arc::clone(shared)),
            None => Ticker::Owned(interval(self.start, self.period)),
        }
    }
}

fn interval(start: Instant, period: Duration) -> Interval {
    let first = start.checked_add(period).unwrap_or(start);
    let mut interval = time::interval_at(first, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// One worker's view of the pacing schedule
#[derive(Debug)]
pub enum Ticker {
    /// Competes with other workers for each tick
    Shared(Arc<Mutex<Interval>>),

    /// Receives every tick
    Owned(Interval),
}

impl Ticker {
    /// Wait for this worker's next tick
    ///
    /// Cancel safe: dropping the future before it resolves consumes no tick.
    pub async fn tick(&mut self) -> Instant {
        match self {
            Ticker::Shared(shared) => shared.lock().await.tick().await,
            Ticker::Owned(interval) => interval.tick().await,
        }
    }
}
