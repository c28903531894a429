//! API server lifecycle — bind, spawn, shut down.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel.

use axum::Router;
use tokio::sync::oneshot;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: std::net::SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind the listener and spawn the axum server in a background task.
pub async fn start_server(bind_addr: &str, app: Router) -> Result<ApiServer, std::io::Error> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer { addr, shutdown_tx: Some(shutdown_tx) })
}
