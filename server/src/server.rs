//! HTTP server lifecycle

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use ratelimit_core::{AdmissionGate, RateLimiter, TokenBucketLimiter};

use crate::app;
use crate::error::{ServerError, ServerResult};

/// Default time allowed for open connections to drain after shutdown begins
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A bound listener plus the gate it serves behind
///
/// Binding and serving are split so callers (and tests binding port 0) can
/// read [`local_addr`](Self::local_addr) before the first request.
pub struct Server<L: ?Sized = TokenBucketLimiter> {
    listener: TcpListener,
    local_addr: SocketAddr,
    gate: AdmissionGate<L>,
}

impl<L> Server<L>
where
    L: RateLimiter + ?Sized + 'static,
{
    /// Bind `addr` and guard it with `limiter`
    ///
    /// A bare `:port` binds all interfaces.
    pub async fn bind(addr: &str, limiter: Arc<L>) -> ServerResult<Self> {
        let addr = normalize_addr(addr);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.as_str(), e))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            gate: AdmissionGate::new(limiter),
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` is cancelled, then wait for open connections
    /// to finish
    pub async fn run(self, shutdown: CancellationToken) -> ServerResult<()> {
        tracing::info!(addr = %self.local_addr, "Server listening");

        axum::serve(self.listener, app::router(self.gate))
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("Shutting down server");
            })
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Like [`run`](Self::run), but stop waiting for connections `grace`
    /// after `shutdown` fires
    pub async fn run_with_grace(self, shutdown: CancellationToken, grace: Duration) -> ServerResult<()> {
        let serve = self.run(shutdown.clone());
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => return result,
            () = shutdown.cancelled() => {}
        }

        match tokio::time::timeout(grace, serve).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs_f64(),
                    "Grace period elapsed, dropping open connections"
                );
                Ok(())
            }
        }
    }
}

impl<L: ?Sized> std::fmt::Debug for Server<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_owned()
    }
}
