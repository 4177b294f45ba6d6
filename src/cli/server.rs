//! `server` command

use std::sync::Arc;

use anyhow::{Context, Result};

use ratelimit_core::shutdown::cancel_on_signal;
use ratelimit_core::{LimiterConfig, TokenBucketLimiter};
use ratelimit_server::Server;
use tokio_util::sync::CancellationToken;

use super::ServerArgs;

pub async fn run(args: ServerArgs) -> Result<()> {
    let limiter = TokenBucketLimiter::try_new(LimiterConfig::new(args.rate, args.capacity))
        .context("invalid rate limiter settings")?;
    let (rate, capacity) = (limiter.rate(), limiter.capacity());

    let server = Server::bind(&args.addr, Arc::new(limiter))
        .await
        .with_context(|| format!("failed to start server on {}", args.addr))?;

    tracing::info!(
        addr = %server.local_addr(),
        rate,
        capacity,
        "Server starting with rate limit"
    );

    let shutdown = CancellationToken::new();
    let signal = cancel_on_signal(shutdown.clone());

    let result = server.run_with_grace(shutdown, args.grace).await;
    signal.abort();

    result.context("server failed")
}
