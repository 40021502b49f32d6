//! Certifying Service
//!
//! Stateless per request: run the policy, hash the response with
//! Keccak-256, sign the digest with the node's long-term BLS key.

use async_trait::async_trait;
use shared_crypto::{response_digest, BlsKeyPair};
use shared_types::{OperatorId, TaskIndex};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::{CertifyError, PolicyContext, PolicyKind, ResponsePolicy};
use crate::ports::{CertifyApi, SignedResponse};

/// Signer-side certification service.
pub struct CertifyingService {
    keypair: BlsKeyPair,
    policy: Arc<dyn ResponsePolicy>,
    context: PolicyContext,
}

impl CertifyingService {
    pub fn new(keypair: BlsKeyPair, policy: Arc<dyn ResponsePolicy>, context: PolicyContext) -> Self {
        Self {
            keypair,
            policy,
            context,
        }
    }

    /// Operator identity derived from the signing key.
    pub fn operator_id(&self) -> OperatorId {
        OperatorId::from_public_key(&self.keypair.public_key())
    }

    pub fn context(&self) -> &PolicyContext {
        &self.context
    }
}

#[async_trait]
impl CertifyApi for CertifyingService {
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    async fn certify(&self, task_index: TaskIndex, payload: &[u8]) -> Result<SignedResponse, CertifyError> {
        let data = self.policy.respond(&self.context, payload).await?;

        let digest = response_digest(&data);
        let signature = self.keypair.sign_digest(&digest);
        debug!(%digest, "Response signed");

        Ok(SignedResponse { data, signature })
    }

    fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParityPolicy, PolicyError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service(policy: Arc<dyn ResponsePolicy>) -> CertifyingService {
        let keypair = BlsKeyPair::from_seed(&[9u8; 32]);
        let context = PolicyContext {
            operator_id: OperatorId::from_public_key(&keypair.public_key()),
            listen_addr: "127.0.0.1:8080".parse().unwrap(),
        };
        CertifyingService::new(keypair, policy, context)
    }

    #[tokio::test]
    async fn test_valid_payload_signature_verifies() {
        let service = service(Arc::new(ParityPolicy));
        let signed = service.certify(1, &[0x10]).await.unwrap();

        assert_eq!(signed.data, vec![0x10]);
        let public_key = BlsKeyPair::from_seed(&[9u8; 32]).public_key();
        assert!(public_key.verify(&response_digest(&signed.data), &signed.signature));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_invalid_argument() {
        let service = service(Arc::new(ParityPolicy));
        assert_eq!(
            service.certify(1, &[0x11]).await,
            Err(CertifyError::InvalidArgument(PolicyError::OddValue))
        );
    }

    struct RecordingPolicy {
        seen: AtomicUsize,
        expected: OperatorId,
    }

    #[async_trait]
    impl ResponsePolicy for RecordingPolicy {
        fn kind(&self) -> PolicyKind {
            PolicyKind::Parity
        }

        async fn respond(&self, context: &PolicyContext, payload: &[u8]) -> Result<Vec<u8>, PolicyError> {
            assert_eq!(context.operator_id, self.expected);
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(payload.iter().rev().copied().collect())
        }
    }

    #[tokio::test]
    async fn test_policy_receives_local_context() {
        let expected = OperatorId::from_public_key(&BlsKeyPair::from_seed(&[9u8; 32]).public_key());
        let policy = Arc::new(RecordingPolicy {
            seen: AtomicUsize::new(0),
            expected,
        });
        let service = service(policy.clone());

        let signed = service.certify(3, &[1, 2, 3]).await.unwrap();
        assert_eq!(signed.data, vec![3, 2, 1]);
        assert_eq!(policy.seen.load(Ordering::SeqCst), 1);
        assert_eq!(service.operator_id(), expected);
    }
}
