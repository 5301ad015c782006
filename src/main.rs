//! See `lib.rs` for documentation.

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use std::process;

use arduino_bridge::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();

    if let Err(e) = arduino_bridge::launch(config).await {
        error!("{}", e);
        process::exit(1);
    }
}
