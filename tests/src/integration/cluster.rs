//! # Signer Cluster Fixtures
//!
//! Real [`SignerNode`]s bound to ephemeral loopback ports, plus a coordinator
//! wired to them through the HTTP transport.

use async_trait::async_trait;
use at_01_transport::{HttpOperatorRequester, TransportConfig, TransportError};
use at_02_certifier::{NodeError, PolicyContext, PolicyError, PolicyKind, ResponsePolicy, SignerNode};
use at_03_aggregation::{BlsAggregationService, InMemoryOperatorRegistry};
use at_04_coordinator::{CoordinatorConfig, CoordinatorService};
use shared_crypto::{BlsKeyPair, BlsPublicKey};
use shared_types::{BlockNumber, OperatorRecord, QuorumNum, StakeAmount};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Block every fixture registers its operators at.
pub const BLOCK: BlockNumber = 100;

/// Quorum every fixture operator is staked in.
pub const QUORUM: QuorumNum = 0;

pub type HttpCoordinator =
    CoordinatorService<BlsAggregationService<InMemoryOperatorRegistry>, InMemoryOperatorRegistry, HttpOperatorRequester>;

/// A signer node serving on a background task.
pub struct RunningSigner {
    pub record: OperatorRecord,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), NodeError>>,
}

impl RunningSigner {
    /// Start a node on `127.0.0.1:0` with `stake` in [`QUORUM`].
    pub async fn spawn(
        keypair: BlsKeyPair,
        stake: StakeAmount,
        policy: Arc<dyn ResponsePolicy>,
    ) -> Result<Self, NodeError> {
        let public_key = keypair.public_key();
        let node = SignerNode::new(SocketAddr::from(([127, 0, 0, 1], 0)), keypair, policy);
        let listener = node.bind().await?;
        let addr = listener.local_addr()?;

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(async move { node.serve_with_shutdown(listener, rx).await });

        Ok(Self {
            record: staked_record(public_key, addr.to_string(), stake),
            shutdown,
            task,
        })
    }

    /// Signal graceful shutdown and wait for the server task.
    pub async fn stop(self) -> Result<(), NodeError> {
        self.shutdown.send_replace(true);
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(NodeError::Config(format!("server task failed: {e}"))),
        }
    }
}

fn staked_record(
    public_key: BlsPublicKey,
    socket: String,
    stake: StakeAmount,
) -> OperatorRecord {
    OperatorRecord::new(public_key, socket, [(QUORUM, stake)].into_iter().collect())
}

/// A registered operator whose socket refuses connections.
pub fn unreachable_record(keypair: &BlsKeyPair, stake: StakeAmount) -> std::io::Result<OperatorRecord> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(staked_record(keypair.public_key(), addr.to_string(), stake))
}

/// Transport timeouts short enough for tests.
pub fn test_transport() -> TransportConfig {
    TransportConfig {
        connect_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_secs(5),
    }
}

/// Coordinator over an in-memory registry holding `records` at [`BLOCK`].
pub fn coordinator(
    records: Vec<OperatorRecord>,
    aggregation_window: Duration,
) -> Result<HttpCoordinator, TransportError> {
    let registry = Arc::new(InMemoryOperatorRegistry::new());
    registry.insert_snapshot(BLOCK, records);
    coordinator_with_registry(registry, aggregation_window)
}

/// Coordinator over a caller-supplied registry.
pub fn coordinator_with_registry(
    registry: Arc<InMemoryOperatorRegistry>,
    aggregation_window: Duration,
) -> Result<HttpCoordinator, TransportError> {
    let engine = Arc::new(BlsAggregationService::new(Arc::clone(&registry)));
    let requester = Arc::new(HttpOperatorRequester::new(test_transport())?);
    Ok(CoordinatorService::with_config(
        engine,
        registry,
        requester,
        CoordinatorConfig { aggregation_window },
    ))
}

/// Policy that answers only after a delay; used to hold a round open.
pub struct StallingPolicy(pub Duration);

#[async_trait]
impl ResponsePolicy for StallingPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Parity
    }

    async fn respond(&self, _context: &PolicyContext, payload: &[u8]) -> Result<Vec<u8>, PolicyError> {
        tokio::time::sleep(self.0).await;
        Ok(payload.to_vec())
    }
}
