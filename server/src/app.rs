//! Router assembly

use axum::middleware;
use axum::routing::{get, MethodRouter};
use axum::Router;

use ratelimit_core::{AdmissionGate, RateLimiter};

use crate::handlers;
use crate::middleware::admission_middleware;

/// Build the application router
///
/// Every path is served by the same method router (`GET` answers, anything
/// else is 405, `HEAD` included), and the whole router sits behind the
/// admission gate.
pub fn router<L>(gate: AdmissionGate<L>) -> Router
where
    L: RateLimiter + ?Sized + 'static,
{
    // axum answers HEAD with the GET handler unless HEAD has its own route
    let root: MethodRouter = get(handlers::root)
        .head(handlers::method_not_allowed)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route("/", root.clone())
        .route("/*path", root)
        .layer(middleware::from_fn_with_state(gate, admission_middleware::<L>))
}
