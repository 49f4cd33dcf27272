//! Reload observers and their panic-isolated fan-out.

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Observer notified after every reload attempt that reached the loader.
pub trait ReloadCallback: Send + Sync {
    fn on_reload(&self, unit_name: &str, success: bool, error: Option<&str>);
}

impl<F> ReloadCallback for F
where
    F: Fn(&str, bool, Option<&str>) + Send + Sync,
{
    fn on_reload(&self, unit_name: &str, success: bool, error: Option<&str>) {
        self(unit_name, success, error)
    }
}

/// Ordered, append-only list of callbacks.
///
/// Dispatch is synchronous: every callback has returned (or panicked) by the time
/// `dispatch` returns.
#[derive(Default)]
pub struct CallbackDispatcher {
    callbacks: RwLock<Vec<Arc<dyn ReloadCallback>>>,
}

impl CallbackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, callback: Arc<dyn ReloadCallback>) {
        self.callbacks.write().push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback in registration order. Returns how many panicked.
    pub fn dispatch(&self, unit_name: &str, success: bool, error: Option<&str>) -> usize {
        // Clone the list so callbacks may register further callbacks
        let callbacks: Vec<Arc<dyn ReloadCallback>> = self.callbacks.read().clone();

        let mut panics = 0;
        for (index, callback) in callbacks.iter().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                callback.on_reload(unit_name, success, error);
            }));

            if let Err(payload) = result {
                panics += 1;
                error!(
                    unit = %unit_name,
                    callback_index = index,
                    panic = %panic_message(payload.as_ref()),
                    "Reload callback panicked"
                );
            }
        }
        panics
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
