//! # Signer Node Lifecycle
//!
//! Binds a [`CertifyingService`] to a listening socket. Failing to bind is
//! fatal; once bound the node serves until its shutdown signal fires or the
//! process stops.

use shared_crypto::BlsKeyPair;
use shared_types::OperatorId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::adapters::{build_router, EthRpcStateReader};
use crate::domain::{
    BlockHashPolicy, CallProxyPolicy, NodeError, ParityPolicy, PolicyContext, PolicyKind,
    ResponsePolicy,
};
use crate::ports::{CertifyApi, StateReader};
use crate::service::CertifyingService;

/// Signer node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address to serve on.
    pub listen_addr: SocketAddr,
    /// Response policy.
    pub policy: PolicyKind,
    /// Ethereum RPC endpoint, required by state-reading policies.
    pub eth_rpc_url: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            policy: PolicyKind::Parity,
            eth_rpc_url: None,
        }
    }
}

impl NodeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.policy.needs_state() && self.eth_rpc_url.is_none() {
            return Err(NodeError::Config(format!(
                "policy '{}' requires an Ethereum RPC URL",
                self.policy
            )));
        }
        Ok(())
    }
}

/// Construct the named policy over an optional state reader.
pub fn build_policy(
    kind: PolicyKind,
    state: Option<Arc<dyn StateReader>>,
) -> Result<Arc<dyn ResponsePolicy>, NodeError> {
    let require_state = || {
        state
            .clone()
            .ok_or_else(|| NodeError::Config(format!("policy '{}' requires a state reader", kind)))
    };
    Ok(match kind {
        PolicyKind::Parity => Arc::new(ParityPolicy),
        PolicyKind::BlockHash => Arc::new(BlockHashPolicy::new(require_state()?)),
        PolicyKind::CallProxy => Arc::new(CallProxyPolicy::new(require_state()?)),
    })
}

/// A certifying service bound to a network endpoint.
pub struct SignerNode {
    listen_addr: SocketAddr,
    service: Arc<CertifyingService>,
}

impl SignerNode {
    /// Create a node with an explicit policy.
    pub fn new(listen_addr: SocketAddr, keypair: BlsKeyPair, policy: Arc<dyn ResponsePolicy>) -> Self {
        let context = PolicyContext {
            operator_id: OperatorId::from_public_key(&keypair.public_key()),
            listen_addr,
        };
        Self {
            listen_addr,
            service: Arc::new(CertifyingService::new(keypair, policy, context)),
        }
    }

    /// Create a node from configuration, wiring an Ethereum RPC state reader
    /// when the policy needs one.
    pub fn from_config(config: &NodeConfig, keypair: BlsKeyPair) -> Result<Self, NodeError> {
        config.validate()?;
        let state: Option<Arc<dyn StateReader>> = match (&config.eth_rpc_url, config.policy.needs_state()) {
            (Some(url), true) => Some(Arc::new(
                EthRpcStateReader::new(url.clone()).map_err(|e| NodeError::Config(e.to_string()))?,
            )),
            _ => None,
        };
        let policy = build_policy(config.policy, state)?;
        Ok(Self::new(config.listen_addr, keypair, policy))
    }

    pub fn operator_id(&self) -> OperatorId {
        self.service.operator_id()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn service(&self) -> Arc<CertifyingService> {
        Arc::clone(&self.service)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, NodeError> {
        TcpListener::bind(self.listen_addr)
            .await
            .map_err(|source| NodeError::Bind {
                addr: self.listen_addr,
                source,
            })
    }

    /// Bind and serve until the process stops.
    pub async fn start(&self) -> Result<(), NodeError> {
        let listener = self.bind().await?;
        self.start_with_listener(listener).await
    }

    /// Serve on an already-bound listener until the process stops.
    pub async fn start_with_listener(&self, listener: TcpListener) -> Result<(), NodeError> {
        // Sender kept alive so the signal never fires
        let (_tx, rx) = watch::channel(false);
        self.serve_with_shutdown(listener, rx).await
    }

    /// Serve until `shutdown` becomes `true` or its sender is dropped.
    pub async fn serve_with_shutdown(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), NodeError> {
        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            operator_id = %self.operator_id(),
            policy = %self.service.policy_kind(),
            "Signer node listening"
        );

        let service: Arc<dyn CertifyApi> = self.service.clone();
        axum::serve(listener, build_router(service))
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow_and_update() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!(addr = %local_addr, "Signer node stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticStateReader;

    #[test]
    fn test_config_requires_rpc_for_state_policies() {
        let mut config = NodeConfig {
            policy: PolicyKind::CallProxy,
            ..NodeConfig::default()
        };
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
        config.eth_rpc_url = Some("http://127.0.0.1:8545".to_string());
        assert!(config.validate().is_ok());
        assert!(NodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_build_policy_kinds() {
        let state: Arc<dyn StateReader> = Arc::new(StaticStateReader::new(0));
        for kind in PolicyKind::ALL {
            let policy = build_policy(kind, Some(state.clone())).unwrap();
            assert_eq!(policy.kind(), kind);
        }
        assert!(build_policy(PolicyKind::BlockHash, None).is_err());
        assert!(build_policy(PolicyKind::Parity, None).is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = occupied.local_addr().unwrap();

        let node = SignerNode::new(addr, BlsKeyPair::from_seed(&[1u8; 32]), Arc::new(ParityPolicy));
        assert!(matches!(node.start().await, Err(NodeError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let node = SignerNode::new(
            "127.0.0.1:0".parse().unwrap(),
            BlsKeyPair::from_seed(&[1u8; 32]),
            Arc::new(ParityPolicy),
        );
        let listener = node.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { node.serve_with_shutdown(listener, rx).await });

        let health: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["policy"], "parity");

        tx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
