//! Registry of active countdowns, at most one per device key

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use tracing::debug;

use super::TimerHandle;

/// Owns the key -> handle map.
///
/// Every mutation goes through one mutex, so replacing the handle for a key
/// and cancelling the old one happen as a single step.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    handles: Mutex<HashMap<String, Arc<TimerHandle>>>,
    next_id: AtomicU64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new handle
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TimerHandle>>> {
        // A panic elsewhere never leaves the map half-updated, so keep using it.
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `handle` for its key, cancelling the handle it replaces.
    ///
    /// Returns the superseded handle, already signalled.
    pub fn arm(&self, handle: Arc<TimerHandle>) -> Option<Arc<TimerHandle>> {
        let mut handles = self.lock();
        let previous = handles.insert(handle.key().to_string(), handle);
        if let Some(previous) = &previous {
            previous.cancel();
            debug!("Superseded timer {} for {}", previous.id(), previous.key());
        }
        previous
    }

    /// Cancel and remove the handle for `key`, if any.
    pub fn cancel(&self, key: &str) -> Option<Arc<TimerHandle>> {
        let removed = self.lock().remove(key);
        if let Some(handle) = &removed {
            handle.cancel();
            debug!("Cancelled timer {} for {}", handle.id(), key);
        }
        removed
    }

    pub fn get(&self, key: &str) -> Option<Arc<TimerHandle>> {
        self.lock().get(key).cloned()
    }

    /// Remove `handle` if it is still the one registered for its key.
    ///
    /// A loop that finishes after being superseded must not evict its replacement.
    pub fn release(&self, handle: &TimerHandle) -> bool {
        let mut handles = self.lock();
        match handles.get(handle.key()) {
            Some(current) if current.id() == handle.id() => {
                handles.remove(handle.key());
                true
            }
            _ => false,
        }
    }

    /// Cancel every registered handle, returning how many there were
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().map(|(_, handle)| handle).collect();
        for handle in &drained {
            handle.cancel();
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
