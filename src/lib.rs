//! mailshelf - email archive indexer and viewer backend
//!
//! Indexes a directory tree of raw email files (`root/<user>/<folder>/…`,
//! one message per file) into a SQLite store with a synchronized FTS5
//! index, and serves the archive to a viewer over a small REST API.
//!
//! ## Module Organization
//!
//! - `parser/`: raw message bytes to structured fields
//! - `walker/`: archive traversal and user/folder inference
//! - `store/`: SQLite store + search index (insert, query, structure)
//! - `scan/`: batch ingestion orchestration
//! - `directory`: derived user/folder navigation tree
//! - `server/`: HTTP API (thin wrappers over the above)
//! - `config/`: TOML configuration
//! - `types/`: shared records and the error taxonomy

pub mod config;
pub mod directory;
pub mod parser;
pub mod scan;
pub mod server;
pub mod store;
pub mod types;
pub mod walker;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::server::{AppState, Server};
use crate::store::MessageStore;
use crate::types::error::{Result, ShelfError};

/// Load configuration, open the store, and serve the API until CTRL+C.
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = config::load(config_path.as_deref())?;

    let bind_addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ShelfError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = MessageStore::open(&config.db_path)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let state = AppState {
        store,
        auth: config.auth.clone(),
        scan_lock: tokio::sync::Mutex::new(()),
        cancel: cancel.clone(),
    };

    let (exit_signal, _provoke_exit) = server::watch_ctrl_c();

    // A shutdown also cancels any scan in flight.
    {
        let mut exit = exit_signal.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if exit.changed().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    Server::new(bind_addr, state).run(exit_signal).await
}
