//! Schema module - Configuration and seeding types for Life streams.

mod config;
mod seed;

pub use config::*;
pub use seed::*;
