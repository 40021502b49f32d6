//! In-memory state reader for tests and local runs.

use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::{H160, H256};
use std::collections::HashMap;

use crate::domain::{CallRequest, StateError};
use crate::ports::StateReader;

/// Fixed chain view: a head number, known block hashes and canned call
/// results keyed by target address.
#[derive(Debug, Default)]
pub struct StaticStateReader {
    head: RwLock<u64>,
    block_hashes: RwLock<HashMap<u64, H256>>,
    call_results: RwLock<HashMap<H160, Vec<u8>>>,
}

impl StaticStateReader {
    pub fn new(head: u64) -> Self {
        Self {
            head: RwLock::new(head),
            ..Self::default()
        }
    }

    pub fn with_block_hash(self, number: u64, hash: H256) -> Self {
        self.block_hashes.write().insert(number, hash);
        self
    }

    pub fn with_call_result(self, to: H160, result: Vec<u8>) -> Self {
        self.call_results.write().insert(to, result);
        self
    }

    /// Move the head.
    pub fn set_head(&self, head: u64) {
        *self.head.write() = head;
    }
}

#[async_trait]
impl StateReader for StaticStateReader {
    async fn current_block_number(&self) -> Result<u64, StateError> {
        Ok(*self.head.read())
    }

    async fn block_hash(&self, number: u64) -> Result<H256, StateError> {
        self.block_hashes
            .read()
            .get(&number)
            .copied()
            .ok_or_else(|| StateError::NotFound(format!("block {}", number)))
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, StateError> {
        self.call_results
            .read()
            .get(&call.to)
            .cloned()
            .ok_or_else(|| StateError::NotFound(format!("no code at {:?}", call.to)))
    }
}
