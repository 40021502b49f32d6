//! # at-04-coordinator
//!
//! Drives certification rounds for Quorum-Attest.
//!
//! ## Round
//!
//! 1. Register the task with the [`AggregationEngine`](at_03_aggregation::AggregationEngine)
//! 2. Resolve the quorum's operators at the task's block
//! 3. Ask every operator concurrently via the
//!    [`OperatorRequester`](at_01_transport::OperatorRequester)
//! 4. Forward each parsed signature to the engine
//! 5. Return the engine's certificate, its expiry error, or the caller's
//!    cancellation, whichever comes first
//!
//! Rounds never overlap: [`CoordinatorService::get_certificate`] holds a
//! round guard for the whole call.

pub mod domain;
pub mod service;

pub use domain::{CertificateRequest, CoordinatorConfig, CoordinatorError};
pub use service::CoordinatorService;
