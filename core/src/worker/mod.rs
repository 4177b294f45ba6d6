//! Load workers
//!
//! A worker is the execution unit of a load run: **tick -> send -> classify ->
//! record**, until the run's deadline passes or the run is cancelled. Workers
//! keep no per-request state; everything they need is shared through `Arc`.
//!
//! 1. Wait for the next tick from its [`Ticker`]
//! 2. Stop if the deadline has passed
//! 3. Send one request through the [`RequestSender`](crate::traits::RequestSender),
//!    bounded by the request timeout
//! 4. Classify the reply as success, rate limited or error
//! 5. Record the outcome in its own [`WorkerStats`] and the run-wide
//!    [`ResultAggregator`](crate::pool::ResultAggregator)
//!
//! Workers are normally spawned by [`LoadWorkerPool`](crate::pool::LoadWorkerPool).

mod builder;
mod executor;
mod pacer;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use pacer::{Pacer, Ticker};
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;
