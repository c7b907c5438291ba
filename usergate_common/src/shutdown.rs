//! Graceful shutdown on Ctrl-C.

use ::tracing::{info, warn};

/// Resolve once the process receives Ctrl-C.
/// If the signal handler cannot be installed, never resolve and keep serving.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(err) => {
            warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await
        }
    }
}
