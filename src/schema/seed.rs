//! Seed types for initial Life populations.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::index_for;

use super::ConfigError;

/// Complete seed specification for a starting population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    /// Pattern to use for seeding.
    pub pattern: Pattern,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            pattern: Pattern::Random {
                density: 0.3,
                seed: None,
            },
        }
    }
}

/// Predefined patterns for initialization.
///
/// Coordinates wrap around the torus, so any `(x, y)` is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Uniform random fill.
    Random {
        /// Fraction of live cells (0.0-1.0).
        density: f64,
        /// Random seed (None = entropy).
        seed: Option<u64>,
    },
    /// Single glider heading south-east, upper-left corner at `(x, y)`.
    Glider { x: i64, y: i64 },
    /// Horizontal period-2 blinker, leftmost cell at `(x, y)`.
    Blinker { x: i64, y: i64 },
    /// Explicit live cells.
    Custom {
        /// List of (x, y) live cells.
        cells: Vec<(i64, i64)>,
    },
}

const GLIDER: [(i64, i64); 5] = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
const BLINKER: [(i64, i64); 3] = [(0, 0), (1, 0), (2, 0)];

impl Seed {
    /// Validate pattern parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Pattern::Random { density, .. } = self.pattern {
            if !(0.0..=1.0).contains(&density) {
                return Err(ConfigError::InvalidDensity(density));
            }
        }
        Ok(())
    }

    /// Generate the initial value sequence (0 or 1 per cell, row-major).
    pub fn generate(&self, cols: usize, rows: usize) -> Result<Vec<i64>, ConfigError> {
        self.validate()?;
        let values = match &self.pattern {
            Pattern::Random { density, seed } => {
                RandomFill::new(*density, *seed).generate(cols, rows)
            }
            Pattern::Glider { x, y } => stamp(cols, rows, &offset(&GLIDER, *x, *y)),
            Pattern::Blinker { x, y } => stamp(cols, rows, &offset(&BLINKER, *x, *y)),
            Pattern::Custom { cells } => stamp(cols, rows, cells),
        };
        Ok(values)
    }
}

fn offset(cells: &[(i64, i64)], x: i64, y: i64) -> Vec<(i64, i64)> {
    cells.iter().map(|&(cx, cy)| (cx + x, cy + y)).collect()
}

fn stamp(cols: usize, rows: usize, cells: &[(i64, i64)]) -> Vec<i64> {
    let mut values = vec![0; cols * rows];
    for &(x, y) in cells {
        values[index_for(cols, rows, x, y)] = 1;
    }
    values
}

/// Random population source with a fixed live-cell fraction.
///
/// Successive calls to [`RandomFill::generate`] draw fresh populations from
/// the same RNG stream, so a seeded fill is reproducible.
pub struct RandomFill {
    density: f64,
    rng: StdRng,
}

impl RandomFill {
    /// Create a fill; `seed = None` seeds from entropy.
    ///
    /// # Panics
    /// Panics if `density` is outside `[0, 1]`.
    pub fn new(density: f64, seed: Option<u64>) -> Self {
        assert!(
            (0.0..=1.0).contains(&density),
            "density must be within [0, 1], got {density}"
        );
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { density, rng }
    }

    /// Draw a new `cols x rows` population.
    pub fn generate(&mut self, cols: usize, rows: usize) -> Vec<i64> {
        (0..cols * rows)
            .map(|_| self.rng.gen_bool(self.density) as i64)
            .collect()
    }
}
