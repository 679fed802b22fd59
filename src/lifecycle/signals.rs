//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT or SIGTERM
//! - Report which one arrived so startup can log it
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A handler that cannot be installed never resolves, so the other one
//!   still works

/// Resolve once a stop signal arrives and return its name.
pub async fn wait_for_stop_signal() -> &'static str {
    #[cfg(unix)]
    {
        tokio::select! {
            _ = interrupt() => "SIGINT",
            _ = terminate() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    {
        interrupt().await;
        "SIGINT"
    }
}

async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for SIGINT");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}
