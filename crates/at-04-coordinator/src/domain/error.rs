//! Coordinator error types

use at_03_aggregation::{AggregationError, RegistryError};
use shared_types::{CancelReason, TypeError};
use thiserror::Error;

/// Failure of one `get_certificate` round.
///
/// Per-operator failures never appear here; they only show up as
/// non-signers in the certificate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Threshold or expiry out of range.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] TypeError),

    /// The engine refused the task (e.g. index already active).
    #[error("Failed to initialize task: {0}")]
    TaskInit(AggregationError),

    /// The operator set could not be resolved.
    #[error("Failed to get operators: {0}")]
    Registry(RegistryError),

    /// The engine reported a failure, including expiry.
    #[error("Aggregation failed: {0}")]
    Aggregation(AggregationError),

    /// The caller cancelled or its deadline passed.
    #[error("Round cancelled: {0}")]
    Cancelled(CancelReason),
}

impl CoordinatorError {
    /// Whether the round expired before any response reached threshold.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoordinatorError::Aggregation(AggregationError::TaskExpired(_)))
    }
}
