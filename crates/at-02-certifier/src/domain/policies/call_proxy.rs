//! Call-proxy policy: attest to the result of a read-only call.

use async_trait::async_trait;
use shared_crypto::{keccak256, keccak256_concat};
use std::sync::Arc;
use tracing::debug;

use crate::domain::{CallRequest, PolicyContext, PolicyError, PolicyKind, ResponsePolicy};
use crate::ports::StateReader;

/// Bounds on accepted calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallProxyLimits {
    pub min_payload: usize,
    pub max_payload: usize,
    /// The call's block must be at least this far behind the head.
    pub min_block_depth: u64,
    /// ...and at most this far.
    pub max_block_depth: u64,
    pub max_gas: u64,
}

impl Default for CallProxyLimits {
    fn default() -> Self {
        Self {
            min_payload: CallRequest::HEADER_LEN,
            max_payload: 128_000,
            min_block_depth: 100,
            max_block_depth: 10_000,
            max_gas: 30_000_000,
        }
    }
}

/// Executes the encoded call at its block and responds with
/// `keccak256(keccak256(payload) ‖ keccak256(return data))`.
///
/// Only blocks deep enough to be settled but recent enough to still be
/// served are accepted, so honest signers observe the same state.
pub struct CallProxyPolicy {
    state: Arc<dyn StateReader>,
    limits: CallProxyLimits,
}

impl CallProxyPolicy {
    pub fn new(state: Arc<dyn StateReader>) -> Self {
        Self::with_limits(state, CallProxyLimits::default())
    }

    pub fn with_limits(state: Arc<dyn StateReader>, limits: CallProxyLimits) -> Self {
        Self { state, limits }
    }
}

#[async_trait]
impl ResponsePolicy for CallProxyPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::CallProxy
    }

    async fn respond(&self, _context: &PolicyContext, payload: &[u8]) -> Result<Vec<u8>, PolicyError> {
        let limits = &self.limits;
        if payload.len() < limits.min_payload {
            return Err(PolicyError::TooShort {
                min: limits.min_payload,
                actual: payload.len(),
            });
        }
        if payload.len() > limits.max_payload {
            return Err(PolicyError::TooLong {
                max: limits.max_payload,
                actual: payload.len(),
            });
        }

        let head = self.state.current_block_number().await?;
        let call = CallRequest::decode(payload)?;

        let block = call.block_number;
        if block.saturating_add(limits.min_block_depth) > head
            || block.saturating_add(limits.max_block_depth) < head
        {
            return Err(PolicyError::BlockOutOfRange { block, head });
        }
        if call.gas > limits.max_gas {
            return Err(PolicyError::GasTooHigh {
                gas: call.gas,
                max: limits.max_gas,
            });
        }

        let return_data = self.state.call(&call).await?;
        debug!(block, head, return_len = return_data.len(), "Call executed");

        Ok(keccak256_concat(&[&keccak256(payload), &keccak256(&return_data)]).to_vec())
    }
}
