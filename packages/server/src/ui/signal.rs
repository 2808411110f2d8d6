//! Graceful shutdown signal handling.

/// Resolves when the process receives Ctrl+C or SIGTERM.
///
/// Passed to `axum::serve(..).with_graceful_shutdown(..)` so in-flight
/// requests and open WebSocket sessions get a chance to finish before the
/// listener stops accepting.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
