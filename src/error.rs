//! Error types for the hot-reload registry and its surrounding tooling.

use thiserror::Error;

/// Why a reload or registration request did not produce a new handle.
///
/// `Load` is a unit failure and is recorded in the reload history. `NotRegistered` and
/// `Debounced` are rejected requests: they are returned to the caller but never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReloadError {
    /// The loader could not produce a handle; carries the loader's diagnostic.
    #[error("{0}")]
    Load(String),

    /// Reload requested for a name that is not in the unit table.
    #[error("not registered")]
    NotRegistered(String),

    /// Request arrived inside the unit's debounce window.
    #[error("debounced")]
    Debounced(String),
}

impl ReloadError {
    /// Name of the unit the error refers to, when the variant carries one.
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            ReloadError::Load(_) => None,
            ReloadError::NotRegistered(name) | ReloadError::Debounced(name) => Some(name),
        }
    }

    /// Whether the error belongs in the permanent reload history.
    pub fn is_recorded(&self) -> bool {
        matches!(self, ReloadError::Load(_))
    }
}

/// Errors raised by configuration, logging, watching and the CLI layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Reload error: {0}")]
    Reload(#[from] ReloadError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<notify::Error> for ApiError {
    fn from(err: notify::Error) -> Self {
        ApiError::WatchError(err.to_string())
    }
}
