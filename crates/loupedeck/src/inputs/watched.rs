//! Observable integer cell.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

pub type Watcher = Arc<dyn Fn(i32) + Send + Sync>;

struct Inner {
    value: Mutex<i32>,
    watchers: RwLock<Vec<Watcher>>,
}

/// An integer shared between controls and the application.
///
/// Every [`set`](WatchedValue::set) notifies all watchers in registration
/// order, even if the value did not change. Clones share the same cell.
#[derive(Clone)]
pub struct WatchedValue {
    inner: Arc<Inner>,
}

impl WatchedValue {
    pub fn new(value: i32) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(value),
                watchers: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> i32 {
        *self.inner.value.lock()
    }

    /// Store `value` and run every watcher with it.
    pub fn set(&self, value: i32) {
        *self.inner.value.lock() = value;

        // Snapshot so watchers can add watchers or set the value again.
        let watchers = self.inner.watchers.read().clone();
        for watcher in watchers {
            watcher(value);
        }
    }

    pub fn add_watcher<F>(&self, watcher: F)
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.inner.watchers.write().push(Arc::new(watcher));
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.read().len()
    }
}

impl Default for WatchedValue {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for WatchedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchedValue")
            .field("value", &self.get())
            .field("watchers", &self.watcher_count())
            .finish()
    }
}
