//! # at-02-certifier
//!
//! Signer side of Quorum-Attest.
//!
//! ## Architecture
//!
//! ```text
//! POST / (node_certify) ─→ [rpc_server] ─→ CertifyingService
//!                                               │
//!                               ResponsePolicy ─┤─→ StateReader (eth RPC / static)
//!                                               │
//!                               keccak256 ─→ BLS sign ─→ {signature, data}
//! ```
//!
//! The [`ResponsePolicy`] is the only domain-specific piece. Built-in
//! strategies are enumerated by [`PolicyKind`]: `parity`, `block-hash` and
//! `call-proxy`. A policy refusal becomes an invalid-argument error and no
//! signature is produced.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let keypair = BlsKeyPair::from_hex(&secret_hex)?;
//! let node = SignerNode::from_config(&NodeConfig::default(), keypair)?;
//! node.start().await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod node;
pub mod ports;
pub mod service;

pub use adapters::{EthRpcStateReader, StaticStateReader};
pub use domain::{
    CallRequest, CertifyError, NodeError, PolicyContext, PolicyError, PolicyKind, ResponsePolicy,
    StateError,
};
pub use node::{build_policy, NodeConfig, SignerNode};
pub use ports::{CertifyApi, SignedResponse, StateReader};
pub use service::CertifyingService;
