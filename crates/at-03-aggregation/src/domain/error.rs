//! Error types for the aggregation subsystem

use shared_crypto::CryptoError;
use shared_types::{BlockNumber, OperatorId, TaskIndex, TypeError};

/// Aggregation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("Invalid task parameters: {0}")]
    InvalidParams(#[from] TypeError),

    #[error("Task {0} is already active")]
    TaskAlreadyInitialized(TaskIndex),

    #[error("Task {0} is not active")]
    TaskNotFound(TaskIndex),

    #[error("Completion signal for task {0} was already taken")]
    CompletionAlreadyTaken(TaskIndex),

    #[error("Task {0} expired before any response reached threshold")]
    TaskExpired(TaskIndex),

    #[error("Task {0} was abandoned")]
    TaskAbandoned(TaskIndex),

    #[error("Unknown operator: {0}")]
    UnknownOperator(OperatorId),

    #[error("Duplicate signature from operator: {0}")]
    DuplicateSignature(OperatorId),

    #[error("Response digest does not match response from operator: {0}")]
    DigestMismatch(OperatorId),

    #[error("Signature verification failed for operator: {0}")]
    InvalidSignature(OperatorId),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Operator registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("No operator snapshot at or before block {0}")]
    NoSnapshot(BlockNumber),

    #[error("Failed to load operator set: {0}")]
    Load(String),

    #[error("Invalid operator entry: {0}")]
    InvalidEntry(String),
}
