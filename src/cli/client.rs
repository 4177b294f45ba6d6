//! `client` command

use anyhow::{Context, Result};

use ratelimit_core::shutdown::shutdown_signal;
use ratelimit_core::{LoadRunConfig, LoadWorkerPoolBuilder};

use super::ClientArgs;

pub async fn run(args: ClientArgs) -> Result<()> {
    let config = LoadRunConfig::new(args.server)
        .with_concurrency(args.concurrency)
        .with_duration(args.duration)
        .with_target_rate(args.rate)
        .with_request_timeout(args.timeout)
        .with_pacing(args.pacing);

    let pool = LoadWorkerPoolBuilder::new()
        .config(config)
        .build()
        .context("invalid load test settings")?;

    // Workers stop themselves at the deadline; the outer bound only catches
    // requests that hang past it
    let limit = args.duration.saturating_add(args.grace);
    let report = pool
        .run_until(async move {
            tokio::select! {
                () = shutdown_signal() => {}
                () = tokio::time::sleep(limit) => {
                    tracing::warn!(limit_secs = limit.as_secs_f64(), "Run exceeded its time limit");
                }
            }
        })
        .await
        .context("load test failed")?;

    println!("{report}");
    Ok(())
}
