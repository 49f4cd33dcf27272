//! Configuration
//!
//! Layered configuration built with the `config` crate. Precedence, lowest first:
//! built-in defaults, global file, workspace file, `HOTLOAD_*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::registry::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotloadConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub units: UnitsConfig,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HotloadConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.registry.validate()?;
        self.units.validate()?;
        self.watch.validate()
    }
}

/// Registry tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Minimum interval between non-forced reloads of one unit
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of records kept in the reload history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl RegistryConfig {
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.history_capacity == 0 {
            return Err(ApiError::ConfigError(
                "registry.history_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Where file units live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitsConfig {
    /// Unit directory, relative to the workspace root unless absolute
    #[serde(default = "default_units_root")]
    pub root: PathBuf,

    /// File extension identifying unit sources
    #[serde(default = "default_units_extension")]
    pub extension: String,
}

fn default_units_root() -> PathBuf {
    PathBuf::from("units")
}

fn default_units_extension() -> String {
    "mod".to_string()
}

impl UnitsConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ApiError::ConfigError(
                "units.extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Unit directory resolved against `workspace_root`.
    pub fn resolve_root(&self, workspace_root: &std::path::Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            workspace_root.join(&self.root)
        }
    }
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            root: default_units_root(),
            extension: default_units_extension(),
        }
    }
}

/// Watch adapter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Per-path event debounce window in milliseconds
    #[serde(default = "default_watch_debounce_ms")]
    pub debounce_ms: u64,

    /// Batch window in milliseconds
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,

    /// Maximum events per batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Ignore globs; `*` stays inside one path segment, `**` spans directories
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

fn default_watch_debounce_ms() -> u64 {
    100
}

fn default_batch_window_ms() -> u64 {
    50
}

fn default_max_batch_size() -> usize {
    100
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/.DS_Store".to_string(),
        "**/*.swp".to_string(),
        "**/*.tmp".to_string(),
        "**/*~".to_string(),
    ]
}

impl WatchSettings {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.batch_window_ms == 0 {
            return Err(ApiError::ConfigError(
                "watch.batch_window_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(ApiError::ConfigError(
                "watch.max_batch_size must be greater than zero".to_string(),
            ));
        }
        for pattern in &self.ignore_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                ApiError::ConfigError(format!("watch.ignore_patterns: {}: {}", pattern, e))
            })?;
        }
        Ok(())
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_watch_debounce_ms(),
            batch_window_ms: default_batch_window_ms(),
            max_batch_size: default_max_batch_size(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}
