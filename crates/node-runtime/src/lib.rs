//! # Quorum-Attest Node Runtime
//!
//! Shared startup code for the `signer-node` and `coordinator` binaries.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG` overrides the `info` default)
//! 2. Load configuration from `AT_*` environment variables
//! 3. Wire adapters into the service
//! 4. Run until done, or until Ctrl+C

pub mod config;
pub mod logging;

pub use config::{ConfigError, CoordinatorSettings, SignerSettings};
pub use logging::init_logging;
