//! Hotload: Concurrent Hot-Reload Registry
//!
//! Keeps named units loaded in a running process and swaps them for fresh versions on
//! request. A failed reload never replaces a working handle, requests inside a unit's
//! debounce window are rejected, every attempt lands in a bounded history, and observers
//! are notified after each reload.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod global;
pub mod loader;
pub mod logging;
pub mod registry;
pub mod tooling;
pub mod types;
pub mod watch;

pub use config::{ConfigLoader, HotloadConfig, RegistryConfig};
pub use error::{ApiError, ReloadError};
pub use global::GlobalRegistry;
pub use loader::{CanonicalResolver, FileUnit, FileUnitLoader, PathResolver, UnitLoader};
pub use registry::{Registry, ReloadCallback};
pub use types::{RecordErrorKind, RegistryStatus, ReloadRecord, UnitStatus};
