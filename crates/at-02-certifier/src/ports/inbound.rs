//! Driving ports (Inbound API)

use async_trait::async_trait;
use shared_crypto::BlsSignature;
use shared_types::TaskIndex;

use crate::domain::{CertifyError, PolicyKind};

/// A response together with the signer's signature over its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedResponse {
    /// Response bytes produced by the policy.
    pub data: Vec<u8>,
    /// BLS signature over Keccak-256 of `data`.
    pub signature: BlsSignature,
}

/// Signer-side certification API served over the wire.
#[async_trait]
pub trait CertifyApi: Send + Sync {
    /// Run the policy on `payload` and sign the result.
    async fn certify(&self, task_index: TaskIndex, payload: &[u8]) -> Result<SignedResponse, CertifyError>;

    /// Policy served by this signer.
    fn policy_kind(&self) -> PolicyKind;
}
