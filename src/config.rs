//! Configuration module for the symbol graph engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SYMGRAPH_` and use double
//! underscores to separate nested levels:
//! - `SYMGRAPH_NORMALIZE__PARALLEL_THREADS=8` sets `normalize.parallel_threads`
//! - `SYMGRAPH_SEARCH__FUZZY_THRESHOLD=0.5` sets `search.fuzzy_threshold`
//! - `SYMGRAPH_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Path to the persisted index directory
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Normalization pipeline settings
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Search and fuzzy-matching settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Hotspot detection thresholds
    #[serde(default)]
    pub hotspots: HotspotConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NormalizeConfig {
    /// Number of rayon threads used for per-record normalization
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Minimum batch size before per-record work is parallelized
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Similarity threshold for fuzzy search results (0.0 - 1.0)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f32,

    /// Maximum number of results returned by search operations
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HotspotConfig {
    /// Fan-in at or above which a symbol is flagged
    #[serde(default = "default_fan_in_threshold")]
    pub fan_in_threshold: usize,

    /// Fan-out at or above which a symbol is flagged
    #[serde(default = "default_fan_out_threshold")]
    pub fan_out_threshold: usize,

    /// Total inbound call frequency at or above which a symbol is flagged
    #[serde(default = "default_call_weight_threshold")]
    pub call_weight_threshold: u32,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".symgraph/index")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_parallel_threshold() -> usize {
    512
}
fn default_false() -> bool {
    false
}
fn default_fuzzy_threshold() -> f32 {
    0.3
}
fn default_max_results() -> usize {
    50
}
fn default_fan_in_threshold() -> usize {
    10
}
fn default_fan_out_threshold() -> usize {
    15
}
fn default_call_weight_threshold() -> u32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            debug: false,
            normalize: NormalizeConfig::default(),
            search: SearchConfig::default(),
            hotspots: HotspotConfig::default(),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            max_results: default_max_results(),
        }
    }
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            fan_in_threshold: default_fan_in_threshold(),
            fan_out_threshold: default_fan_out_threshold(),
            call_weight_threshold: default_call_weight_threshold(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from("symgraph.toml")
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Layer in environment variables with SYMGRAPH_ prefix
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("SYMGRAPH_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.index_path, PathBuf::from(".symgraph/index"));
        assert!(!settings.debug);
        assert!(settings.normalize.parallel_threads >= 1);
        assert_eq!(settings.hotspots.fan_in_threshold, 10);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symgraph.toml");
        std::fs::write(
            &path,
            "debug = true\n[search]\nfuzzy_threshold = 0.5\nmax_results = 10\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.search.max_results, 10);
        assert!((settings.search.fuzzy_threshold - 0.5).abs() < f32::EPSILON);
        // Untouched sections keep their defaults
        assert_eq!(settings.hotspots.fan_out_threshold, 15);
    }
}
