//! Configuration types for the Life stream.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_prefetch() -> usize {
    32
}

fn default_low_water() -> usize {
    8
}

/// Top-level configuration: grid shape, random population policy and
/// buffering parameters of the worker proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifeConfig {
    /// Grid width in cells.
    pub cols: usize,
    /// Grid height in cells.
    pub rows: usize,
    /// Fraction of cells alive in a random population (0.0-1.0).
    pub density: f64,
    /// Generations requested per batch.
    #[serde(default = "default_prefetch")]
    pub prefetch: usize,
    /// Buffered generations at or below which another batch is requested.
    #[serde(default = "default_low_water")]
    pub low_water: usize,
    /// RNG seed for random populations (None = entropy).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            cols: 64,
            rows: 48,
            density: 0.3,
            prefetch: default_prefetch(),
            low_water: default_low_water(),
            seed: None,
        }
    }
}

impl LifeConfig {
    /// Total number of cells (`cols * rows`).
    #[inline]
    pub fn size(&self) -> usize {
        self.cols * self.rows
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: LifeConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(ConfigError::InvalidDensity(self.density));
        }
        if self.prefetch == 0 {
            return Err(ConfigError::InvalidPrefetch);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (cols, rows) must be non-zero")]
    InvalidDimensions,
    #[error("Density must be within [0, 1], got {0}")]
    InvalidDensity(f64),
    #[error("Prefetch batch size must be non-zero")]
    InvalidPrefetch,
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}
