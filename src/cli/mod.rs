//! CLI argument parsing and command dispatch

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use ratelimit_core::PacingMode;

mod client;
mod server;

#[derive(Parser)]
#[command(name = "ratelimit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "RATELIMIT_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve `GET /` behind a token-bucket rate limiter
    Server(ServerArgs),
    /// Generate paced load against a server and report outcomes
    Client(ClientArgs),
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Listen address (`:port` binds all interfaces)
    #[arg(long, default_value = "0.0.0.0:8080", env = "RATELIMIT_ADDR")]
    pub addr: String,

    /// Token refill rate (requests/second)
    #[arg(long, default_value_t = 10.0, env = "RATELIMIT_RATE")]
    pub rate: f64,

    /// Bucket capacity (burst size)
    #[arg(long, default_value_t = 20, env = "RATELIMIT_CAPACITY")]
    pub capacity: u32,

    /// Time allowed for open connections to drain on shutdown
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration, env = "RATELIMIT_GRACE")]
    pub grace: Duration,
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Server URL
    #[arg(long, default_value = "http://localhost:8080", env = "RATELIMIT_SERVER")]
    pub server: String,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 5, env = "RATELIMIT_CONCURRENCY")]
    pub concurrency: usize,

    /// Test duration (e.g. `30s`, `2m`)
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, env = "RATELIMIT_DURATION")]
    pub duration: Duration,

    /// Request rate (requests/second)
    #[arg(long, default_value_t = 5.0, env = "RATELIMIT_TARGET_RATE")]
    pub rate: f64,

    /// Per-request timeout
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration, env = "RATELIMIT_TIMEOUT")]
    pub timeout: Duration,

    /// How the rate is shared: `aggregate` (total) or `per-worker`
    #[arg(long, default_value_t = PacingMode::Aggregate, env = "RATELIMIT_PACING")]
    pub pacing: PacingMode,

    /// Extra time allowed past the duration before the run is cut off
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration, env = "RATELIMIT_GRACE")]
    pub grace: Duration,
}

/// Run the selected command
pub async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Server(args) => server::run(args).await,
        Commands::Client(args) => client::run(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_server_defaults() {
        let cli = Cli::parse_from(["ratelimit", "server"]);
        let Commands::Server(args) = cli.command else {
            panic!("expected server command");
        };
        assert_eq!(args.addr, "0.0.0.0:8080");
        assert_eq!(args.rate, 10.0);
        assert_eq!(args.capacity, 20);
        assert_eq!(args.grace, Duration::from_secs(5));
    }

    #[test]
    fn test_client_flags() {
        let cli = Cli::parse_from([
            "ratelimit",
            "--verbose",
            "client",
            "--server",
            "http://127.0.0.1:9000",
            "--concurrency",
            "3",
            "--duration",
            "1s",
            "--rate",
            "10",
            "--timeout",
            "500ms",
            "--pacing",
            "per-worker",
        ]);
        assert!(cli.verbose);

        let Commands::Client(args) = cli.command else {
            panic!("expected client command");
        };
        assert_eq!(args.server, "http://127.0.0.1:9000");
        assert_eq!(args.concurrency, 3);
        assert_eq!(args.duration, Duration::from_secs(1));
        assert_eq!(args.rate, 10.0);
        assert_eq!(args.timeout, Duration::from_millis(500));
        assert_eq!(args.pacing, PacingMode::PerWorker);
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::parse_from(["ratelimit", "server", "--log-format", "json"]);
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
