//! # at-03-aggregation
//!
//! Aggregation engine and operator registry for Quorum-Attest.
//!
//! ## Architecture
//!
//! The coordinator consumes this crate only through two ports:
//!
//! - [`AggregationEngine`]: `initialize_task`, `process_signature`,
//!   `completion_signal`
//! - [`OperatorRegistry`]: operator set and stakes at a block
//!
//! [`BlsAggregationService`] verifies each signature against the operator's
//! BLS public key, groups signatures by response digest, and emits one
//! [`Certificate`](shared_types::Certificate) when a single digest reaches the
//! stake threshold of every requested quorum. [`InMemoryOperatorRegistry`]
//! serves snapshots loaded from TOML.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = Arc::new(InMemoryOperatorRegistry::from_toml_file("operators.toml")?);
//! let engine = BlsAggregationService::new(registry);
//!
//! engine.initialize_task(params).await?;
//! let signal = engine.completion_signal(task_index)?;
//! engine.process_signature(event).await?;
//! let certificate = signal.await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryOperatorRegistry;
pub use domain::{AggregationError, Progress, RegistryError, TaskAggregation};
pub use ports::{AggregationEngine, CompletionSignal, OperatorRegistry};
pub use service::{AggregationConfig, BlsAggregationService};
