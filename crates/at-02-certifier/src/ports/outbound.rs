//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use primitive_types::H256;
use std::sync::Arc;

use crate::domain::{CallRequest, StateError};

/// Read access to the chain state a policy attests to.
#[async_trait]
pub trait StateReader: Send + Sync {
    /// Latest block number known to the reader.
    async fn current_block_number(&self) -> Result<u64, StateError>;

    /// Hash of block `number`.
    async fn block_hash(&self, number: u64) -> Result<H256, StateError>;

    /// Execute `call` against the state at `call.block_number`.
    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, StateError>;
}

#[async_trait]
impl<T: StateReader + ?Sized> StateReader for Arc<T> {
    async fn current_block_number(&self) -> Result<u64, StateError> {
        (**self).current_block_number().await
    }

    async fn block_hash(&self, number: u64) -> Result<H256, StateError> {
        (**self).block_hash(number).await
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, StateError> {
        (**self).call(call).await
    }
}
