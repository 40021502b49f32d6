//! Domain layer for the aggregation subsystem

mod aggregation;
mod error;

pub use aggregation::*;
pub use error::*;
