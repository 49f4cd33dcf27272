//! Merge policy and service for layered configuration.

pub mod service;

use super::HotloadConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

/// Builder seeded with the serialized defaults, so every later layer only
/// needs to name the keys it overrides.
pub(crate) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = toml::to_string(&HotloadConfig::default())
        .map_err(|e| ConfigError::Message(format!("Failed to serialize defaults: {}", e)))?;
    Ok(config::Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml)))
}
