//! Watch adapter: turns file-system change events into path-based reloads.

mod events;
mod runtime;

pub use events::{ChangeEvent, EventBatcher};
pub use runtime::{UnitNamer, WatchDaemon};
