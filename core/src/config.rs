//! Limiter and load run configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Token bucket configuration
///
/// `rate` is the steady refill rate in tokens per second, `capacity` the
/// burst size. The bucket starts full.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Tokens generated per second
    pub rate: f64,

    /// Maximum tokens held
    pub capacity: u32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            rate: 10.0,
            capacity: 20,
        }
    }
}

impl LimiterConfig {
    /// Create a new config
    pub fn new(rate: f64, capacity: u32) -> Self {
        Self { rate, capacity }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ConfigError::InvalidRate(format!(
                "rate must be a positive number, got {}",
                self.rate
            )));
        }

        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// How workers share the request schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// One ticker shared by every worker; each tick is taken by exactly one
    /// worker, so the whole pool issues about `target_rate` requests per second
    #[default]
    Aggregate,

    /// Every worker ticks on its own at `target_rate`, aligned to the same
    /// start instant; the pool issues about `concurrency * target_rate`
    PerWorker,
}

impl fmt::Display for PacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacingMode::Aggregate => f.write_str("aggregate"),
            PacingMode::PerWorker => f.write_str("per-worker"),
        }
    }
}

impl FromStr for PacingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggregate" => Ok(PacingMode::Aggregate),
            "per-worker" | "per_worker" => Ok(PacingMode::PerWorker),
            other => Err(ConfigError::InvalidPacing(format!(
                "expected 'aggregate' or 'per-worker', got '{other}'"
            ))),
        }
    }
}

/// Load run configuration
///
/// Immutable snapshot taken at run start and shared read-only by all workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRunConfig {
    /// Endpoint every worker sends `GET` requests to
    pub target_url: String,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Run length, measured from pool start
    pub duration: Duration,

    /// Requests per second on the scheduling tick
    pub target_rate: f64,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Whether `target_rate` is a pool-wide or per-worker pace
    #[serde(default)]
    pub pacing: PacingMode,
}

impl Default for LoadRunConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:8080".to_string(),
            concurrency: 5,
            duration: Duration::from_secs(30),
            target_rate: 5.0,
            request_timeout: Duration::from_secs(10),
            pacing: PacingMode::Aggregate,
        }
    }
}

impl LoadRunConfig {
    /// Create a new config for the given target with default settings
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Default::default()
        }
    }

    /// Set the concurrency level
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the run duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the target rate (requests per second)
    pub fn with_target_rate(mut self, rps: f64) -> Self {
        self.target_rate = rps;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the pacing mode
    pub fn with_pacing(mut self, pacing: PacingMode) -> Self {
        self.pacing = pacing;
        self
    }

    /// Interval between scheduling ticks (`1s / target_rate`)
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.target_rate).unwrap_or(Duration::MAX)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.target_url)
            .map_err(|e| ConfigError::InvalidTargetUrl(format!("{}: {}", self.target_url, e)))?;

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.duration.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "duration must be greater than zero".into(),
            ));
        }

        if !self.target_rate.is_finite() || self.target_rate <= 0.0 {
            return Err(ConfigError::InvalidTargetRate(format!(
                "target rate must be a positive number, got {}",
                self.target_rate
            )));
        }

        if self.tick_interval().is_zero() {
            return Err(ConfigError::InvalidTargetRate(format!(
                "target rate {} is too high to schedule",
                self.target_rate
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid limiter rate
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// Invalid limiter capacity
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid run duration
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Invalid target rate
    #[error("Invalid target rate: {0}")]
    InvalidTargetRate(String),

    /// Invalid request timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Target URL does not parse
    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    /// Unknown pacing mode
    #[error("Invalid pacing mode: {0}")]
    InvalidPacing(String),
}
