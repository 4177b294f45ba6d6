//! Request replies and outcome classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP status returned when a request is admitted and handled
pub const STATUS_OK: u16 = 200;

/// HTTP status returned when the limiter denies a request
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status code
    pub status: u16,

    /// Response body (empty if it could not be read)
    pub body: String,
}

impl Reply {
    /// Create a new reply
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Classify this reply
    pub fn outcome(&self) -> Outcome {
        Outcome::from_status(self.status)
    }
}

/// Result of one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// `200 OK`
    Success,

    /// `429 Too Many Requests`; expected under load, not an error
    RateLimited,

    /// Transport failure or any other status
    Error,
}

impl Outcome {
    /// Map an HTTP status to an outcome
    pub fn from_status(status: u16) -> Self {
        match status {
            STATUS_OK => Outcome::Success,
            STATUS_TOO_MANY_REQUESTS => Outcome::RateLimited,
            _ => Outcome::Error,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::RateLimited => f.write_str("rate_limited"),
            Outcome::Error => f.write_str("error"),
        }
    }
}
