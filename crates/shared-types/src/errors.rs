//! # Error Types
//!
//! Errors raised while constructing or validating shared entities.

use thiserror::Error;

use crate::entities::QuorumNum;

/// Invariant violations on shared entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// Threshold outside (0, 100].
    #[error("Invalid threshold percentage: {0} (must be in 1..=100)")]
    InvalidThreshold(u8),

    /// A task must request at least one quorum.
    #[error("Task requests no quorums")]
    NoQuorums,

    /// The same quorum was requested twice.
    #[error("Quorum {0} requested more than once")]
    DuplicateQuorum(QuorumNum),

    /// Expiry must be strictly positive.
    #[error("Expiry must be greater than zero")]
    ZeroExpiry,
}
