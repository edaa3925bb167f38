//! HTTP/1.1 API server: accept loop, per-connection tasks, graceful
//! drain on shutdown.

mod auth;
mod router;

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::store::MessageStore;
use crate::types::error::{Result, ShelfError};

/// Shared state handed to every request handler.
pub struct AppState {
    pub store: MessageStore,
    pub auth: Option<AuthConfig>,
    /// Serializes scans (single-writer ingestion).
    pub scan_lock: tokio::sync::Mutex<()>,
    /// Raised on shutdown; running scans stop before their next file.
    pub cancel: Arc<AtomicBool>,
}

pub struct Server {
    bind_addr: SocketAddr,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(bind_addr: SocketAddr, state: AppState) -> Self {
        Self {
            bind_addr,
            state: Arc::new(state),
        }
    }

    /// Serve until `must_exit` flips, then drain in-flight connections.
    pub async fn run(self, mut must_exit: watch::Receiver<bool>) -> Result<()> {
        let tcp = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| ShelfError::Io(format!("Failed to bind {}: {}", self.bind_addr, e)))?;
        info!("API server listening on {}", self.bind_addr);

        let mut connections = FuturesUnordered::new();
        while !*must_exit.borrow() {
            let wait_conn_finished = async {
                if connections.is_empty() {
                    futures::future::pending().await
                } else {
                    connections.next().await
                }
            };
            let (socket, remote_addr) = tokio::select! {
                accepted = tcp.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(err = %err, "accept failed");
                        continue;
                    }
                },
                _ = wait_conn_finished => continue,
                _ = must_exit.changed() => continue,
            };

            let state = self.state.clone();
            let conn = tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = state.clone();
                    async move {
                        Ok::<_, std::convert::Infallible>(
                            router::handle(state, remote_addr, req).await,
                        )
                    }
                });
                if let Err(err) = http1::Builder::new()
                    .serve_connection(TokioIo::new(socket), service)
                    .await
                {
                    warn!(err = %err, "connection failed");
                }
            });
            connections.push(conn);
        }
        drop(tcp);

        info!("Server shutting down, draining remaining connections...");
        while connections.next().await.is_some() {}

        Ok(())
    }
}

/// Flip a watch channel when CTRL+C arrives. The sender is returned so
/// other failures can provoke the same shutdown path.
pub fn watch_ctrl_c() -> (watch::Receiver<bool>, Arc<watch::Sender<bool>>) {
    let (send_cancel, watch_cancel) = watch::channel(false);
    let send_cancel = Arc::new(send_cancel);
    let send_cancel_2 = send_cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        info!("Received CTRL+C, shutting down.");
        let _ = send_cancel.send(true);
    });
    (watch_cancel, send_cancel_2)
}
