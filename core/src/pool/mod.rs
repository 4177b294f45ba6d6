//! Load worker pool
//!
//! The pool owns a load run from start to summary:
//! - Validating the run configuration
//! - Spawning one worker per unit of concurrency, all paced by one [`Pacer`](crate::worker::Pacer)
//! - Stopping workers on deadline, cancellation, signal or timeout
//! - Waiting for every worker, then summarizing the shared counters once
//!
//! # Example
//!
//! ```ignore
//! use ratelimit_core::LoadWorkerPoolBuilder;
//!
//! let pool = LoadWorkerPoolBuilder::new()
//!     .target_url("http://localhost:8080")
//!     .concurrency(3)
//!     .duration(Duration::from_secs(1))
//!     .target_rate(10.0)
//!     .build()?;
//!
//! let report = pool.run().await?;
//! assert_eq!(report.summary.total, report.summary.success + report.summary.rate_limited + report.summary.error);
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{ResultAggregator, RunReport, RunSummary};
pub use builder::LoadWorkerPoolBuilder;
pub use executor::LoadWorkerPool;
