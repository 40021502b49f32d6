//! # Quorum-Attest Test Suite
//!
//! Cross-crate flows that run real signer nodes on loopback sockets and drive
//! them through the HTTP transport and the coordinator.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── cluster.rs            # Signer node fixtures
//!     ├── e2e_certification.rs  # Full rounds: quorum, timeouts, disagreement
//!     └── flows.rs              # Transport and registry wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p at-tests
//! ```

pub mod integration;
