use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Wait for SIGTERM or SIGINT (Ctrl+C).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, stopping"),
        () = terminate => info!("Received SIGTERM, stopping"),
    }
}

/// Token cancelled on the first shutdown signal.
///
/// The watcher task ends with the token, so it never outlives the command.
pub fn cancel_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let watcher = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => watcher.cancel(),
            () = watcher.cancelled() => {}
        }
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_starts_live_and_cancels() {
        let token = cancel_on_signal();
        assert!(!token.is_cancelled());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }
}
