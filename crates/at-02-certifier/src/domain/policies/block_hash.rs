//! Block-hash policy: bind the payload to the block it names.

use async_trait::async_trait;
use shared_crypto::keccak256_concat;
use std::sync::Arc;

use crate::domain::{PolicyContext, PolicyError, PolicyKind, ResponsePolicy};
use crate::ports::StateReader;

/// Leading bytes holding the big-endian block number.
pub const BLOCK_NUMBER_LEN: usize = 8;

/// Response is `keccak256(payload ‖ hash(block))`, where the block number is
/// read from the first eight payload bytes.
pub struct BlockHashPolicy {
    state: Arc<dyn StateReader>,
}

impl BlockHashPolicy {
    pub fn new(state: Arc<dyn StateReader>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ResponsePolicy for BlockHashPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::BlockHash
    }

    async fn respond(&self, _context: &PolicyContext, payload: &[u8]) -> Result<Vec<u8>, PolicyError> {
        if payload.len() < BLOCK_NUMBER_LEN {
            return Err(PolicyError::TooShort {
                min: BLOCK_NUMBER_LEN,
                actual: payload.len(),
            });
        }
        let mut number = [0u8; BLOCK_NUMBER_LEN];
        number.copy_from_slice(&payload[..BLOCK_NUMBER_LEN]);
        let block_hash = self.state.block_hash(u64::from_be_bytes(number)).await?;

        Ok(keccak256_concat(&[payload, block_hash.as_bytes()]).to_vec())
    }
}
