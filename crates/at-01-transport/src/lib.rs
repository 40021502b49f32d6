//! # at-01-transport
//!
//! Coordinator-side transport to signer nodes.
//!
//! [`OperatorRequester`] performs exactly one certification exchange with one
//! operator. [`HttpOperatorRequester`] implements it as a JSON-RPC 2.0 POST
//! over plaintext HTTP with no connection reuse and no retry.
//!
//! Unreachable operators and operators that reject the request both surface
//! as [`TransportError`]; the coordinator does not tell them apart.

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;

pub use adapters::HttpOperatorRequester;
pub use config::TransportConfig;
pub use error::TransportError;
pub use ports::OperatorRequester;
