//! Worker module - the compute host thread and its consumer-side proxy.

mod host;
mod proxy;

pub use host::*;
pub use proxy::*;
