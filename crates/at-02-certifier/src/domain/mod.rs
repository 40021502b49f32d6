//! Domain layer for the certifier subsystem

mod call;
mod error;
pub mod policies;
mod policy;

pub use call::*;
pub use error::*;
pub use policies::{BlockHashPolicy, CallProxyLimits, CallProxyPolicy, ParityPolicy};
pub use policy::*;
