use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::files::FileResolver;
use crate::http::connection::{Connection, ConnectionSettings};

/// Pause after a failed accept so descriptor exhaustion does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Binds the configured address and serves until `shutdown` flips to `true`.
pub async fn run(cfg: &Config, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let resolver = Arc::new(FileResolver::from_config(&cfg.static_files)?);
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.listen_addr))?;

    info!(
        "Listening on {}, serving {}",
        cfg.server.listen_addr,
        resolver.root().display()
    );

    serve(listener, resolver, ConnectionSettings::from(&cfg.server), shutdown).await
}

/// Accept loop. One task per connection, tracked so shutdown can wait for
/// in-flight requests instead of abandoning them.
pub async fn serve(
    listener: TcpListener,
    resolver: Arc<FileResolver>,
    settings: ConnectionSettings,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut workers = JoinSet::new();

    while !*shutdown.borrow() {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection, ignoring");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                debug!("Accepted connection from {}", peer);

                let resolver = Arc::clone(&resolver);
                let shutdown = shutdown.clone();
                workers.spawn(async move {
                    let mut conn = Connection::new(socket, resolver, settings, shutdown);
                    if let Err(e) = conn.run().await {
                        warn!("Connection error from {}: {}", peer, e);
                    }
                });
            }

            Some(finished) = workers.join_next(), if !workers.is_empty() => {
                if let Err(e) = finished {
                    error!(error = %e, "Connection task failed");
                }
            }

            // Also fires if every sender is gone
            _ = shutdown.changed() => break,
        }
    }

    drop(listener);
    info!(active = workers.len(), "Preventing further connections, waiting for in-flight requests");

    while let Some(finished) = workers.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "Connection task failed");
        }
    }

    info!("All connections closed");
    Ok(())
}
