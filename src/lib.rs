//! Toroidal Life - Conway's Game of Life streamed from a worker thread.
//!
//! The simulation engine only recomputes the active region (live cells and
//! their neighbours) and reports each generation as a [`ChangeSet`] of born,
//! died and survived cells. A [`ModelInWorker`] runs the engine on a background
//! thread, buffers batches of change-sets and hands them out one at a time.
//!
//! # Architecture
//!
//! - `schema`: Configuration and seeding types
//! - `compute`: Toroidal grid and the incremental engine (`Model`)
//! - `signal`: Multi-listener broadcast used to publish change-sets
//! - `protocol`: Messages crossing the worker boundary
//! - `worker`: Compute host thread and the consumer-side proxy
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use toroidal_life::{
//!     schema::{LifeConfig, RandomFill},
//!     worker::ModelInWorker,
//! };
//!
//! let config = LifeConfig::default();
//! let values = RandomFill::new(config.density, None).generate(config.cols, config.rows);
//!
//! let mut proxy = ModelInWorker::new(&config, values).unwrap();
//! proxy.changed().tap(|changes| {
//!     println!("+{} -{}", changes.born.len(), changes.died.len());
//! });
//!
//! for _ in 0..100 {
//!     proxy.next_blocking(Duration::from_secs(1)).unwrap();
//! }
//! proxy.randomize().unwrap();
//! ```

pub mod compute;
pub mod protocol;
pub mod schema;
pub mod signal;
pub mod worker;

// Re-export commonly used types
pub use compute::{ChangeSet, Grid, Model};
pub use schema::{LifeConfig, Pattern, Seed};
pub use signal::Signal;
pub use worker::{ComputeHost, ModelInWorker};
