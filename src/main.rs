//! NFT gateway
//!
//! HTTP front for issuing asset NFT classes, minting instances and updating
//! their data on a Coreum ledger.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 NFT GATEWAY                  │
//!     Browser / CLI       │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ handlers │───▶│ ledger  │──┼──▶ gRPC node
//!                         │  │ server  │    └──────────┘    │ handle  │  │
//!                         │  └────┬────┘                    └─────────┘  │
//!                         │       └──▶ static frontend                   │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use nft_gateway::config::loader::{load_config, resolve_path};
use nft_gateway::http::HttpServer;
use nft_gateway::ledger::LedgerHandle;
use nft_gateway::lifecycle::{signals, Shutdown};
use nft_gateway::net::tls::install_crypto_provider;
use nft_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "nft-gateway")]
#[command(about = "HTTP gateway for asset NFT operations", long_about = None)]
struct Args {
    /// Path to the TOML configuration (falls back to NFT_GATEWAY_CONFIG, then gateway.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    install_crypto_provider();

    let args = Args::parse();
    let config_path = resolve_path(args.config);
    let mut config = load_config(&config_path)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("nft-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_path.display(),
        bind_address = %config.listener.bind_address,
        node = %config.ledger.node_address,
        chain_id = %config.ledger.chain_id,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Arc::new(Shutdown::new());

    // Takes the seed phrase and passphrase out of `config`.
    let ledger = LedgerHandle::connect(&mut config)
        .await?
        .with_cancellation(shutdown.subscribe());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { signals::shutdown_on_signal(&shutdown).await }
    });

    let server = HttpServer::new(&config, ledger);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
