//! Compute module - Grid state and the incremental Life engine.

mod grid;
mod model;

pub use grid::*;
pub use model::*;
