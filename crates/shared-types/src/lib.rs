//! # Shared Types Crate
//!
//! Entities, wire types and cancellation primitives shared by the transport,
//! certifier, aggregation and coordinator crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here.
//! - **Checked construction**: thresholds and task parameters are validated
//!   before any round starts.

pub mod cancel;
pub mod entities;
pub mod errors;
pub mod rpc;

pub use cancel::{cancel_pair, CancelHandle, CancelReason, CancelToken};
pub use entities::*;
pub use errors::*;
pub use rpc::{CertifyRequest, CertifyResponse, HexBytes, CERTIFY_METHOD};
