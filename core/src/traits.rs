//! Core traits for rate limiters and request senders
//!
//! The gate is generic over [`RateLimiter`] and the worker pool over
//! [`RequestSender`], so both can be exercised without a network.

use crate::error::Cancelled;
use crate::response::Reply;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Rate Limiter Trait
// ============================================================================

/// Admission decision source
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Take one token if available; never blocks
    fn allow(&self) -> bool;

    /// Wait until a token can be taken or `cancel` fires
    async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled>;
}

// ============================================================================
// Request Sender Trait
// ============================================================================

/// Issues one request against the load target
///
/// Implementations own transport details (HTTP client, timeouts); the worker
/// only classifies the returned [`Reply`].
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// Target identifier, used in logs
    fn target(&self) -> &str;

    /// Send a single request and return the status and body
    async fn send(&self) -> Result<Reply, TransportError>;
}

/// Client-side request failures
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP/network error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request could not be constructed
    #[error("failed to build request: {0}")]
    Build(String),

    /// Request timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Whether this failure was a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout(_) => true,
            TransportError::Http(e) => e.is_timeout(),
            TransportError::Build(_) => false,
        }
    }
}
