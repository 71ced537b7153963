use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinError;
use tracing::{info, warn};

/// Serve the proxy until `shutdown` fires.
///
/// In-flight requests get `grace` to finish. Streamed Docker responses
/// (`/events`, followed logs, attach) never end on their own, so anything
/// still open after that is dropped.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: broadcast::Receiver<()>,
    grace: Duration,
) -> io::Result<()> {
    let (draining_tx, draining_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            let _ = draining_tx.send(());
        });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => return flatten(joined),
        _ = draining_rx => info!("Draining proxy connections"),
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "Proxy connections still open after shutdown grace, closing them"
            );
            server.abort();
            Ok(())
        }
    }
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    joined.map_err(io::Error::other)?
}
