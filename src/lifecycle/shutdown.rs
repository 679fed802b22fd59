//! Shutdown coordination for the daemon.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum DrainError {
    #[error("graceful shutdown did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("server task failed: {0}")]
    Join(#[from] JoinError),
}

/// Wait up to `grace` for a task that was told to stop; abort it afterwards.
pub async fn drain<T>(mut task: JoinHandle<T>, grace: Duration) -> Result<T, DrainError> {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(joined) => Ok(joined?),
        Err(_) => {
            task.abort();
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "Graceful shutdown deadline exceeded, aborting"
            );
            Err(DrainError::DeadlineExceeded(grace))
        }
    }
}
