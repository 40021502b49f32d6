//! Coordinator configuration and request types

use shared_types::{
    BlockNumber, QuorumNum, QuorumThreshold, TaskIndex, TaskParams, ThresholdPercentage, TypeError,
};
use std::time::Duration;

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Extra time signatures are collected after threshold is first met.
    pub aggregation_window: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            aggregation_window: Duration::from_secs(1),
        }
    }
}

/// Arguments of one certification round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub task_index: TaskIndex,
    pub created_at_block: BlockNumber,
    pub quorum: QuorumNum,
    /// Percentage in 1..=100; checked when the round starts.
    pub threshold: u8,
    pub payload: Vec<u8>,
    pub expiry: Duration,
}

impl CertificateRequest {
    /// Convert into engine task parameters, enforcing the task invariants.
    pub fn to_task_params(&self, aggregation_window: Duration) -> Result<TaskParams, TypeError> {
        let params = TaskParams {
            task_index: self.task_index,
            created_at_block: self.created_at_block,
            quorums: vec![QuorumThreshold {
                quorum: self.quorum,
                threshold: ThresholdPercentage::new(self.threshold)?,
            }],
            expiry: self.expiry,
            aggregation_window,
        };
        params.validate()?;
        Ok(params)
    }
}
