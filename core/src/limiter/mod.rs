//! Token bucket rate limiting
//!
//! [`TokenBucketLimiter`] is the admission decision behind the server's gate:
//! a single owned instance, shared by `Arc`, with a non-blocking
//! [`allow`](TokenBucketLimiter::allow) and a polling
//! [`wait`](TokenBucketLimiter::wait).
//!
//! Time comes from a [`Clock`]; production uses [`MonotonicClock`], tests use
//! [`ManualClock`] to step time deterministically.

mod bucket;
mod clock;

pub use bucket::{TokenBucketLimiter, DEFAULT_WAIT_BACKOFF};
pub use clock::{Clock, ManualClock, MonotonicClock};
