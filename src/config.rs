//! Pipeline and store configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Numeric parameters of the comfort-index pipeline.
///
/// Stored as a JSON object on disk; every key is optional:
/// ```json
/// {
///   "sample_rate_hz": 1000.0,
///   "max_pdop": 1000.0,
///   "parallel": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Accelerometer sampling rate in Hz.
    pub sample_rate_hz: f64,
    /// Multiplier from g to m/s².
    pub gravity: f64,
    /// Rows with a pdop above this are discarded.
    pub max_pdop: f64,
    pub scaling_factor: f64,
    pub percentile: f64,
    /// Reduce rows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000.0,
            gravity: 9.81,
            max_pdop: 1000.0,
            scaling_factor: 0.01,
            percentile: 95.0,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config '{path}'"))?;
        let config: Self =
            serde_json::from_str(&content).with_context(|| format!("parsing config '{path}'"))?;
        Ok(config)
    }
}

/// What happens to earlier results when a new dataset is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// Only the newest dataset is kept.
    #[default]
    Replace,
    /// Every stored dataset is kept and contributes to the map.
    Accumulate,
}

/// Where processed datasets live and how long they are kept.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub retention: RetentionPolicy,
}

impl StoreConfig {
    /// Directory from `RCI_STORE_DIR`, falling back to `<tmp>/rci_rater`.
    pub fn default_dir() -> PathBuf {
        std::env::var("RCI_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("rci_rater"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            retention: RetentionPolicy::default(),
        }
    }
}
