//! # Signer Node
//!
//! Serves `node_certify` for one operator key until Ctrl+C.
//!
//! ```text
//! AT_BLS_PRIVATE_KEY=0x1 AT_LISTEN_ADDR=0.0.0.0:8080 AT_POLICY=parity signer-node
//! ```

use anyhow::{Context, Result};
use at_02_certifier::SignerNode;
use node_runtime::{init_logging, SignerSettings};
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging().context("Failed to install tracing subscriber")?;

    let settings = SignerSettings::from_env().context("Failed to load signer configuration")?;
    let node = SignerNode::from_config(&settings.node, settings.keypair)
        .context("Failed to build signer node")?;
    let listener = node.bind().await.context("Failed to bind listen address")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C, stopping"),
        }
        shutdown_tx.send_replace(true);
    });

    node.serve_with_shutdown(listener, shutdown_rx)
        .await
        .context("Signer node failed")?;
    Ok(())
}
