//! Adapters layer (Hexagonal Architecture)

mod registry;

pub use registry::*;
