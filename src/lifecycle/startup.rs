//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the Prometheus exporter when enabled
//! - Build the server and bind the listener
//! - Run until a stop signal, then shut down within the grace period
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{drain, DrainError, Shutdown};
use crate::lifecycle::signals::wait_for_stop_signal;
use crate::observability::metrics::init_metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address [{0}]")]
    MetricsAddress(String),

    #[error("cannot install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("cannot build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error(transparent)]
    Shutdown(#[from] DrainError),
}

/// Run the daemon until it is told to stop.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr = address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        init_metrics(addr)?;
    }

    let addr = config.listener.socket_addr();
    let grace = config.shutdown.grace_period;

    tracing::info!(
        address = %addr,
        prefix = %config.proxy.prefix,
        request_timeout_ms = config.proxy.request_timeout.as_millis() as u64,
        max_redirects = config.proxy.max_redirects,
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        joined = &mut server_task => {
            // The server stopped without being asked to.
            return match joined {
                Ok(result) => Ok(result?),
                Err(err) => Err(DrainError::Join(err).into()),
            };
        }
        signal = wait_for_stop_signal() => {
            tracing::warn!(signal, "Stopping by OS signal");
        }
    }

    shutdown.trigger();
    tracing::debug!(grace_ms = grace.as_millis() as u64, "Draining in-flight requests");

    drain(server_task, grace).await??;
    Ok(())
}
