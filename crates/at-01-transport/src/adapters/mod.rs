//! Adapters layer (Hexagonal Architecture)

mod http;

pub use http::*;
