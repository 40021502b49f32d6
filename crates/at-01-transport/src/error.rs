//! Transport error types

use thiserror::Error;

/// Failure to obtain a certification from one operator.
///
/// Callers are expected to treat every variant the same way: the operator
/// is left out of the round.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection or request could not complete.
    #[error("Operator at {socket} unreachable: {reason}")]
    Unreachable { socket: String, reason: String },

    /// The operator answered with a JSON-RPC error.
    #[error("Operator rejected request ({code}): {message}")]
    Rejected { code: i32, message: String },

    /// The answer was not a valid certification response.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}
