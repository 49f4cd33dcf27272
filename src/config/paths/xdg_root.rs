//! XDG Base Directory lookup for the global config file.

use crate::error::ApiError;
use std::path::PathBuf;

/// `$XDG_CONFIG_HOME` when set and non-empty, else the platform config dir
/// (`$HOME/.config` on Linux).
pub fn config_home() -> Result<PathBuf, ApiError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                ApiError::ConfigError("No config home: neither XDG_CONFIG_HOME nor HOME is set".to_string())
            }),
    }
}

/// `<config home>/hotload/config.toml`, or `None` when no home can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    config_home()
        .ok()
        .map(|home| home.join("hotload").join("config.toml"))
}
