//! Built-in response policies

mod block_hash;
mod call_proxy;
mod parity;

pub use block_hash::*;
pub use call_proxy::*;
pub use parity::*;
