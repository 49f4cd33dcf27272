//! Core value types shared by the registry, the CLI and observers.

use crate::error::ReloadError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Immutable description of one reload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadRecord {
    pub unit_name: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Set when the record is built; the error text is never parsed back.
    #[serde(
        rename = "error_kind",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    kind: Option<RecordErrorKind>,
}

/// Classification of a failed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorKind {
    Load,
    NotRegistered,
    Debounced,
}

impl ReloadRecord {
    pub fn succeeded(unit_name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            unit_name: unit_name.into(),
            timestamp: Utc::now(),
            success: true,
            error: None,
            duration_ms,
            kind: None,
        }
    }

    /// Loader failure: the message is the loader's diagnostic, whatever it says.
    pub fn failed(unit_name: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            unit_name: unit_name.into(),
            timestamp: Utc::now(),
            success: false,
            error: Some(error.into()),
            duration_ms,
            kind: Some(RecordErrorKind::Load),
        }
    }

    /// Record for a request rejected before any load took place.
    pub fn rejected(unit_name: impl Into<String>, reason: &ReloadError) -> Self {
        let kind = match reason {
            ReloadError::Load(_) => RecordErrorKind::Load,
            ReloadError::NotRegistered(_) => RecordErrorKind::NotRegistered,
            ReloadError::Debounced(_) => RecordErrorKind::Debounced,
        };
        Self {
            kind: Some(kind),
            ..Self::failed(unit_name, reason.to_string(), 0)
        }
    }

    /// Error taxonomy of a failed record. `None` on success.
    pub fn error_kind(&self) -> Option<RecordErrorKind> {
        if self.success {
            return None;
        }
        // Records deserialized without a kind can only have come from a load
        Some(self.kind.unwrap_or(RecordErrorKind::Load))
    }

    pub fn is_debounced(&self) -> bool {
        self.error_kind() == Some(RecordErrorKind::Debounced)
    }

    /// Convert the record into a `Result`, mapping failures back onto [`ReloadError`].
    pub fn into_result(self) -> Result<ReloadRecord, ReloadError> {
        match self.error_kind() {
            None => Ok(self),
            Some(RecordErrorKind::Debounced) => Err(ReloadError::Debounced(self.unit_name)),
            Some(RecordErrorKind::NotRegistered) => {
                Err(ReloadError::NotRegistered(self.unit_name))
            }
            Some(RecordErrorKind::Load) => Err(ReloadError::Load(self.error.unwrap_or_default())),
        }
    }
}

/// Per-unit section of [`RegistryStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub registered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reloaded_at: Option<DateTime<Utc>>,
    pub reload_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location: Option<PathBuf>,
}

/// Point-in-time snapshot of the registry, safe to serialize and hand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStatus {
    pub units: BTreeMap<String, UnitStatus>,
    pub total_reloads: u64,
    pub history_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_history_at: Option<DateTime<Utc>>,
}
