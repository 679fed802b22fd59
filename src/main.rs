//! HTTP forward proxy daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                 PROXY DAEMON                  │
//!                     │                                               │
//!   Client Request    │  ┌─────────┐    ┌───────────┐    ┌─────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│ forwarder │───▶│ client  │──┼──▶ Target
//!                     │  │ server  │    │  target   │    │(reqwest)│  │
//!                     │  └─────────┘    └───────────┘    └─────────┘  │
//!                     │                       │                       │
//!   Client Response   │  ┌─────────┐          ▼                       │
//!   ◀─────────────────┼──│  relay  │◀── upstream body ◀───────────────┼─── Target
//!                     │  │  body   │───▶ counters                     │
//!                     │  └─────────┘                                  │
//!                     │                                               │
//!                     │  config · cli · observability · lifecycle     │
//!                     └───────────────────────────────────────────────┘
//! ```

use clap::Parser;

use http_proxy_daemon::cli::{Cli, Command};
use http_proxy_daemon::http::handlers::VERSION;
use http_proxy_daemon::lifecycle::startup;
use http_proxy_daemon::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let args = match cli.command {
        Command::Version => {
            println!("Version: {VERSION}");
            return Ok(());
        }
        Command::Serve(args) => args,
    };

    let config = args.load()?;
    logging::init(&config.observability)?;

    tracing::info!(version = VERSION, "http-proxy-daemon starting");

    if let Err(err) = startup::run(config).await {
        tracing::error!(error = %err, "Server stopped with an error");
        return Err(err.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
