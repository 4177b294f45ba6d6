//! Error types for ratelimit-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::traits::TransportError;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid limiter or load run configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A builder was finished without a required field
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Request could not be built, sent or completed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Waiting for admission was interrupted
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Pool lifecycle error
    #[error("orchestration error: {0}")]
    Orchestration(String),
}

impl Error {
    /// Create a missing-configuration error
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig(field)
    }

    /// Create an orchestration error
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::Orchestration(message.into())
    }
}

/// Returned by [`RateLimiter::wait`](crate::traits::RateLimiter::wait) when the
/// cancellation token fires before a token could be taken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("wait for admission cancelled")]
pub struct Cancelled;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
