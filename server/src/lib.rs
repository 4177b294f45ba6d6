//! ratelimit-server: an HTTP endpoint behind a token-bucket admission gate
//!
//! Every request asks the shared limiter for one token before it is routed.
//! Admitted `GET`s get a timestamped `200`; other admitted methods get `405`;
//! denied requests of any method get `429 Rate limit exceeded`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ratelimit_core::TokenBucketLimiter;
//! use ratelimit_server::Server;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(TokenBucketLimiter::new(10.0, 20)?);
//! let server = Server::bind(":8080", limiter).await?;
//! server.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use app::router;
pub use error::{ServerError, ServerResult};
pub use middleware::Throttled;
pub use server::{Server, DEFAULT_GRACE_PERIOD};
