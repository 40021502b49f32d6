//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid key or signature length
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Bytes are not valid hex
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    /// Invalid public key (not a point in the G2 subgroup)
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key (zero or not below the group order)
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature (not a point in the G1 subgroup)
    #[error("Invalid signature")]
    InvalidSignature,

    /// BLS aggregation failed
    #[error("BLS aggregation failed")]
    AggregationFailed,

    /// Cannot aggregate an empty list
    #[error("Cannot aggregate an empty list")]
    EmptyAggregation,
}
