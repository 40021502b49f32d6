//! Domain layer for the coordinator

mod config;
mod error;

pub use config::*;
pub use error::*;
