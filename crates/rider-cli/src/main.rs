//! Rider console client binary.
//!
//! # Usage
//!
//! ```bash
//! # Against a local backend
//! rider --api-url http://localhost:3000
//!
//! # Keep the session somewhere else, with transport logs on stderr
//! RIDER_TOKEN_DB=/var/lib/rider/session.redb rider --log-level debug
//! ```
//!
//! Type `help` for the command list.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use rider_app::Runtime;
use rider_cli::{ConsoleDriver, SessionStore, console::spawn_stdin_reader};
use rider_client::{ClientConfig, transport::SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rider console client
#[derive(Parser, Debug)]
#[command(name = "rider")]
#[command(about = "Console client for delivery riders")]
#[command(version)]
struct Args {
    /// Base URL of the backend
    #[arg(long, env = "RIDER_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// File the session token is kept in between runs
    #[arg(long, env = "RIDER_TOKEN_DB", default_value = "rider-session.redb")]
    store: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so they never interleave with frames
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    rider_proto::realtime::socket_url(&args.api_url)?;
    let config = ClientConfig {
        request_timeout: Duration::from_secs(args.request_timeout),
        ..ClientConfig::new(args.api_url)
    };

    tracing::info!(api_url = %config.api_url, store = %args.store.display(), "starting");
    let store = SessionStore::open(&args.store);
    let driver = ConsoleDriver::new(&config, spawn_stdin_reader(), std::io::stdout())?;

    Runtime::new(driver, SystemEnv::new(), config, store).run().await?;
    Ok(())
}
