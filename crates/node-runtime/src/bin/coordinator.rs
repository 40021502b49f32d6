//! # Coordinator
//!
//! Runs one certification round against the operators listed in
//! `AT_OPERATORS_FILE` and prints the certificate as JSON on stdout.
//! Ctrl+C cancels the round.

use anyhow::{Context, Result};
use at_01_transport::HttpOperatorRequester;
use at_03_aggregation::{BlsAggregationService, InMemoryOperatorRegistry};
use at_04_coordinator::CoordinatorService;
use node_runtime::{init_logging, CoordinatorSettings};
use shared_types::cancel_pair;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging().context("Failed to install tracing subscriber")?;

    let settings =
        CoordinatorSettings::from_env().context("Failed to load coordinator configuration")?;
    let registry = Arc::new(
        InMemoryOperatorRegistry::from_toml_file(&settings.operators_file).with_context(|| {
            format!(
                "Failed to load operators from {}",
                settings.operators_file.display()
            )
        })?,
    );
    let engine = Arc::new(BlsAggregationService::new(Arc::clone(&registry)));
    let requester = Arc::new(
        HttpOperatorRequester::new(settings.transport.clone())
            .context("Failed to build HTTP client")?,
    );
    let coordinator = CoordinatorService::with_config(
        engine,
        registry,
        requester,
        settings.coordinator.clone(),
    );

    let (cancel, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling round");
            cancel.cancel();
        }
    });

    info!(
        task_index = settings.request.task_index,
        block = settings.request.created_at_block,
        quorum = settings.request.quorum,
        threshold = settings.request.threshold,
        "Starting certification round"
    );
    let certificate = coordinator
        .get_certificate(settings.request, token)
        .await
        .context("Certification round failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&certificate).context("Failed to encode certificate")?
    );
    Ok(())
}
