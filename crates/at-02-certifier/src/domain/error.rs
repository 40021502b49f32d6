//! Error types for the certifier subsystem

use std::net::SocketAddr;
use thiserror::Error;

/// Why a response policy refused a payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("data too short: {actual} bytes, need at least {min}")]
    TooShort { min: usize, actual: usize },

    #[error("data too long: {actual} bytes, at most {max}")]
    TooLong { max: usize, actual: usize },

    #[error("value is odd")]
    OddValue,

    #[error("block {block} out of range for head {head}")]
    BlockOutOfRange { block: u64, head: u64 },

    #[error("gas too high: {gas} > {max}")]
    GasTooHigh { gas: u64, max: u64 },

    #[error("state lookup failed: {0}")]
    State(#[from] StateError),
}

/// Failure to read chain state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed RPC result: {0}")]
    Malformed(String),
}

/// Certification failure returned to the requester.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertifyError {
    /// The policy rejected the payload; nothing was signed.
    #[error("data is invalid: {0}")]
    InvalidArgument(#[from] PolicyError),
}

/// Signer node lifecycle errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The listening address could not be bound. Fatal at startup.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Invalid node configuration: {0}")]
    Config(String),
}
