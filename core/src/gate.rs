//! Admission gate in front of a downstream handler
//!
//! The gate asks its limiter exactly once per request. A denied request never
//! reaches the downstream; an admitted one is passed through and its result
//! returned unchanged. There is no retry and no queueing.

use std::future::Future;
use std::sync::Arc;

use crate::limiter::TokenBucketLimiter;
use crate::traits::RateLimiter;

/// Result of passing a request through an [`AdmissionGate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission<T> {
    /// The limiter admitted the request; holds the downstream result
    Admitted(T),

    /// The limiter denied the request; the downstream was not invoked
    Throttled,
}

impl<T> Admission<T> {
    /// Whether the downstream ran
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }

    /// Downstream result, if admitted
    pub fn into_admitted(self) -> Option<T> {
        match self {
            Admission::Admitted(value) => Some(value),
            Admission::Throttled => None,
        }
    }

    /// Transform the downstream result
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Admission<U> {
        match self {
            Admission::Admitted(value) => Admission::Admitted(f(value)),
            Admission::Throttled => Admission::Throttled,
        }
    }
}

/// Guards a downstream handler with a shared [`RateLimiter`]
///
/// Clones share the same limiter.
pub struct AdmissionGate<L: ?Sized = TokenBucketLimiter> {
    limiter: Arc<L>,
}

impl<L: RateLimiter + ?Sized> AdmissionGate<L> {
    /// Create a gate backed by `limiter`
    pub fn new(limiter: Arc<L>) -> Self {
        Self { limiter }
    }

    /// The shared limiter
    pub fn limiter(&self) -> &Arc<L> {
        &self.limiter
    }

    /// Run `handler` if the limiter admits the request
    pub fn admit<T>(&self, handler: impl FnOnce() -> T) -> Admission<T> {
        if self.limiter.allow() {
            Admission::Admitted(handler())
        } else {
            Admission::Throttled
        }
    }

    /// Run and await `handler` if the limiter admits the request
    ///
    /// The admission decision is made before `handler` is called, so a
    /// throttled request never constructs the downstream future.
    pub async fn admit_async<F, Fut>(&self, handler: F) -> Admission<Fut::Output>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        if self.limiter.allow() {
            Admission::Admitted(handler().await)
        } else {
            Admission::Throttled
        }
    }
}

impl<L: ?Sized> Clone for AdmissionGate<L> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for AdmissionGate<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate").finish_non_exhaustive()
    }
}
