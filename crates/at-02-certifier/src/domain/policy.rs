//! # Response Policies
//!
//! A policy is the single domain-specific extension point of a signer node:
//! it turns a request payload into response bytes or refuses it. Honest
//! signers running the same policy against the same observed state must
//! produce byte-identical responses, otherwise their digests will not group.

use async_trait::async_trait;
use shared_types::OperatorId;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use super::PolicyError;

/// Local signer configuration visible to a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyContext {
    /// This signer's operator identity.
    pub operator_id: OperatorId,
    /// Address the node serves on.
    pub listen_addr: SocketAddr,
}

/// Computes the response a signer is willing to sign.
#[async_trait]
pub trait ResponsePolicy: Send + Sync {
    /// Which named strategy this is.
    fn kind(&self) -> PolicyKind;

    /// Produce response bytes for `payload`, or refuse it.
    async fn respond(&self, context: &PolicyContext, payload: &[u8]) -> Result<Vec<u8>, PolicyError>;
}

/// Enumerable policy strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Accept even big-endian integers and echo them back.
    Parity,
    /// Bind the payload to the hash of the block it names.
    BlockHash,
    /// Execute a read-only call at a recent block and commit to its result.
    CallProxy,
}

impl PolicyKind {
    /// Every variant, in declaration order.
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Parity, PolicyKind::BlockHash, PolicyKind::CallProxy];

    /// Canonical configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Parity => "parity",
            PolicyKind::BlockHash => "block-hash",
            PolicyKind::CallProxy => "call-proxy",
        }
    }

    /// Whether the policy reads chain state.
    pub fn needs_state(self) -> bool {
        !matches!(self, PolicyKind::Parity)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown policy '{}', expected one of: parity, block-hash, call-proxy",
                    s
                )
            })
    }
}
