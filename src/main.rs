use std::path::PathBuf;

use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Can be overridden with the RUST_LOG environment variable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("mailshelf=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Err(err) = mailshelf::run(config_path).await {
        error!("Fatal: {}", err);
        std::process::exit(1);
    }
}
