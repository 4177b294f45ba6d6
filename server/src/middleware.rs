//! Admission middleware

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use ratelimit_core::{Admission, AdmissionGate, RateLimiter};

/// Rejection for a request the limiter denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttled;

impl Throttled {
    /// Response body
    pub const BODY: &'static str = "Rate limit exceeded";
}

impl IntoResponse for Throttled {
    fn into_response(self) -> Response {
        (StatusCode::TOO_MANY_REQUESTS, Self::BODY).into_response()
    }
}

/// Ask the gate once; forward on admission, answer 429 otherwise
///
/// Installed with `from_fn_with_state` outside the method router, so every
/// method pays for a token before it is dispatched.
pub async fn admission_middleware<L>(
    State(gate): State<AdmissionGate<L>>,
    request: Request,
    next: Next,
) -> Response
where
    L: RateLimiter + ?Sized + 'static,
{
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match gate.admit_async(|| next.run(request)).await {
        Admission::Admitted(response) => response,
        Admission::Throttled => {
            tracing::debug!(%method, %path, "Request throttled");
            Throttled.into_response()
        }
    }
}
