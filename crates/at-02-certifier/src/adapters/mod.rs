//! Adapters layer (Hexagonal Architecture)

mod eth_rpc;
pub mod rpc_server;
mod static_state;

pub use eth_rpc::*;
pub use rpc_server::build_router;
pub use static_state::*;
