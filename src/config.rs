//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (FLOWLOG_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [storage]
//! data_dir = "/var/lib/stratalog/data"
//! default_database = "default"
//!
//! [storage.slab]
//! slab_size_bytes = 2097152
//! max_open_slabs = 256
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! FLOWLOG_STORAGE__DATA_DIR=/custom/path
//! FLOWLOG_STORAGE__SLAB__SLAB_SIZE_BYTES=4194304
//! ```

use figment::{Figment, providers::{Env, Format, Toml}};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all database storage
    pub data_dir: PathBuf,

    /// Default database (created on startup if missing)
    pub default_database: String,

    /// Automatically create databases if they don't exist
    #[serde(default)]
    pub auto_create_databases: bool,

    /// Slab storage runtime settings
    #[serde(default)]
    pub slab: SlabStoreConfig,

    /// Performance settings
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Slab-based persistent storage runtime configuration (SPEC_FULL §4.6-§4.8, §11)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlabStoreConfig {
    /// Size of a single slab in bytes. The runtime rounds allocations up to
    /// this boundary; 2 MiB matches the slab manager's mmap granularity.
    #[serde(default = "default_slab_size_bytes")]
    pub slab_size_bytes: usize,

    /// Maximum number of slabs the manager keeps mapped open simultaneously
    /// before evicting the least-recently-used one.
    #[serde(default = "default_max_open_slabs")]
    pub max_open_slabs: usize,

    /// Run garbage collection (reclaiming freed slabs) automatically.
    #[serde(default = "default_true")]
    pub gc_enabled: bool,

    /// Fraction of free slabs (0.0-1.0) that triggers a GC pass when
    /// `gc_enabled` is set.
    #[serde(default = "default_gc_threshold")]
    pub gc_threshold: f64,
}

fn default_slab_size_bytes() -> usize {
    2 * 1024 * 1024
}
fn default_max_open_slabs() -> usize {
    256
}
fn default_gc_threshold() -> f64 {
    0.25
}

impl Default for SlabStoreConfig {
    fn default() -> Self {
        SlabStoreConfig {
            slab_size_bytes: default_slab_size_bytes(),
            max_open_slabs: default_max_open_slabs(),
            gc_enabled: true,
            gc_threshold: default_gc_threshold(),
        }
    }
}

/// Performance tuning options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Initial capacity for in-memory collections
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Batch size for bulk operations
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of worker threads for the induction engine's per-shard workers.
    /// 0 = use all available CPU cores
    #[serde(default)]
    pub num_threads: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_initial_capacity() -> usize { 10000 }
fn default_batch_size() -> usize { 1000 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. config.toml (base configuration)
    /// 2. config.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (FLOWLOG_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("FLOWLOG_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("FLOWLOG_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: PathBuf::from("./data"),
                default_database: "default".to_string(),
                auto_create_databases: false,
                slab: SlabStoreConfig::default(),
                performance: PerformanceConfig::default(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            initial_capacity: default_initial_capacity(),
            batch_size: default_batch_size(),
            num_threads: 0, // 0 = use all available CPU cores
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.default_database, "default");
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.storage.slab.slab_size_bytes, 2 * 1024 * 1024);
        assert!(config.storage.slab.gc_enabled);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();

        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[storage.slab]"));
        assert!(toml_str.contains("[logging]"));
    }
}
