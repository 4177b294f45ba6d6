//! ratelimit-core: token-bucket admission control and a paced load generator
//!
//! This crate provides the building blocks shared by the server and the load
//! client:
//!
//! - [`TokenBucketLimiter`] and the [`AdmissionGate`] that puts it in front of
//!   a handler
//! - [`LoadWorkerPool`], its workers and the [`ResultAggregator`] they report to
//! - Configuration, error types and the [`RateLimiter`] / [`RequestSender`]
//!   traits at the seams

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod gate;
pub mod limiter;
pub mod pool;
pub mod response;
pub mod sender;
pub mod shutdown;
pub mod traits;
pub mod worker;

pub use config::{ConfigError, LimiterConfig, LoadRunConfig, PacingMode};
pub use error::{Cancelled, Error, Result};
pub use gate::{Admission, AdmissionGate};
pub use limiter::{Clock, ManualClock, MonotonicClock, TokenBucketLimiter};
pub use pool::{LoadWorkerPool, LoadWorkerPoolBuilder, ResultAggregator, RunReport, RunSummary};
pub use response::{Outcome, Reply};
pub use sender::HttpSender;
pub use traits::{RateLimiter, RequestSender, TransportError};
pub use worker::{Worker, WorkerBuilder, WorkerStats};
