//! HTTP server startup with bounded graceful shutdown.

use std::future::IntoFuture;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::{ServerError, ServerResult, TRACING_TARGET_SHUTDOWN, TRACING_TARGET_STARTUP};
use crate::server::shutdown::shutdown_signal;

/// Binds to the configured address and serves `app` until a shutdown signal.
///
/// After the signal, in-flight requests get up to `shutdown_timeout` to
/// finish; the server then stops regardless.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    let server_addr = server_config.server_addr();

    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            addr = %server_addr,
            error = %err,
            "Failed to bind to address"
        );
        ServerError::bind_error(server_addr, err)
    })?;

    let shutdown_timeout = server_config.shutdown_timeout();
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let graceful = async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    };

    serve_with_shutdown(&server_config, || async move {
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => result,
            Ok(()) = signalled_rx => {
                tracing::info!(
                    target: TRACING_TARGET_SHUTDOWN,
                    timeout_secs = shutdown_timeout.as_secs(),
                    "Graceful shutdown initiated"
                );

                match tokio::time::timeout(shutdown_timeout, &mut server).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            target: TRACING_TARGET_SHUTDOWN,
                            "Shutdown timeout elapsed, dropping in-flight requests"
                        );
                        Ok(())
                    }
                }
            }
        }
    })
    .await
}
