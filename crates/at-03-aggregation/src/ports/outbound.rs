//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use shared_types::{BlockNumber, OperatorId, OperatorRecord, QuorumNum};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::RegistryError;

/// Source of the operator set and stakes at a given block.
#[async_trait]
pub trait OperatorRegistry: Send + Sync {
    /// Operators with stake in at least one of `quorums` as of `block`.
    async fn get_operators_at_block(
        &self,
        quorums: &[QuorumNum],
        block: BlockNumber,
    ) -> Result<BTreeMap<OperatorId, OperatorRecord>, RegistryError>;
}

#[async_trait]
impl<T: OperatorRegistry + ?Sized> OperatorRegistry for Arc<T> {
    async fn get_operators_at_block(
        &self,
        quorums: &[QuorumNum],
        block: BlockNumber,
    ) -> Result<BTreeMap<OperatorId, OperatorRecord>, RegistryError> {
        (**self).get_operators_at_block(quorums, block).await
    }
}
