//! Futon development proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 FUTON PROXY                  │
//!                         │                                              │
//!     Client Request      │  ┌──────────┐    ┌─────────┐                 │
//!     ────────────────────┼─▶│ raw      │───▶│ routing │                 │
//!                         │  │ target   │    └────┬────┘                 │
//!                         │  │ capture  │         │                      │
//!                         │  └──────────┘   ┌─────┼──────────┐           │
//!                         │                 ▼     ▼          ▼           │
//!                         │            redirect  assets    proxy ────────┼──▶ CouchDB
//!                         │              301    (disk)   forwarder ◀─────┼───
//!                         │                                              │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use futon_proxy::cli::Cli;
use futon_proxy::lifecycle::{shutdown_signal, Shutdown};
use futon_proxy::observability::init_logging;
use futon_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Err(e) = cli.check_directory() {
        e.exit();
    }

    let config = cli.into_config()?;
    init_logging(&config.log_level);

    tracing::info!(
        bind_address = %config.bind_address(),
        backend = %config.backend,
        document_root = %config.document_root.display(),
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(server.config().bind_address()).await?;

    let shutdown = Shutdown::new();
    let signals = shutdown.subscribe();
    shutdown.trigger_on(shutdown_signal());

    server.run(listener, signals).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
