//! Graceful shutdown handling
//!
//! Cross-platform signal handling for graceful server shutdown. Listens
//! for termination signals and provides a clean way to shut the server
//! down.

use tokio::sync::oneshot;
use tracing::info;

/// Set up a shutdown signal handler
///
/// Creates a signal handler that listens for termination signals and
/// provides a channel receiver that will be triggered when shutdown is
/// requested.
///
/// # Platform Support
/// * Unix/Linux: Handles SIGINT (Ctrl+C) and SIGTERM signals
/// * Windows: Handles Ctrl+C events
///
/// # Returns
/// * `oneshot::Receiver<()>` - Receiver triggered on shutdown signal
pub async fn setup_shutdown_handler() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut tx = Some(tx);

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = signal(SignalKind::interrupt())
                .expect("Failed to create SIGINT handler");
            let mut sigterm = signal(SignalKind::terminate())
                .expect("Failed to create SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT received - initiating graceful shutdown");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM received - initiating graceful shutdown");
                }
            }
        }

        #[cfg(windows)]
        {
            use tokio::signal::windows::ctrl_c;

            let mut ctrl_c = ctrl_c().expect("Failed to create Ctrl+C handler");

            ctrl_c.recv().await;
            info!("Ctrl+C received - initiating graceful shutdown");
        }

        // Send shutdown signal if sender is still available
        if let Some(tx) = tx.take() {
            let _ = tx.send(());
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_shutdown_handler_creation() {
        // The shutdown handler can be created without panicking
        let shutdown_rx = setup_shutdown_handler().await;

        // The receiver should be ready but not yet triggered
        let result = timeout(Duration::from_millis(10), shutdown_rx).await;
        assert!(result.is_err()); // Should timeout since no signal was sent
    }
}
