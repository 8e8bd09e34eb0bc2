//! The store and notifier as seen by the timer and reconcile paths

use std::{fmt, sync::Arc};

use tracing::{debug, warn};

use super::{Notifier, NotifyError, RecordStore, StoreError};
use crate::state::{DevicePatch, DeviceRecord};

/// Cheap-to-clone bundle of the two external collaborators
#[derive(Clone)]
pub struct Backends {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    namespace: Arc<str>,
}

impl Backends {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        namespace: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            notifier,
            namespace: namespace.into(),
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Notification topic for a device key
    pub fn topic(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }

    pub async fn persist(&self, key: &str, patch: &DevicePatch) -> Result<DeviceRecord, StoreError> {
        self.store.update(key, patch).await
    }

    /// Send exactly the fields present in `patch`.
    pub async fn notify(&self, key: &str, patch: &DevicePatch) -> Result<(), NotifyError> {
        let payload = serde_json::to_value(patch)?;
        self.notifier.send(&self.topic(key), &payload).await
    }

    /// Notify on a detached task; failures are only logged.
    pub fn notify_detached(&self, key: &str, patch: DevicePatch) {
        let backends = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            match backends.notify(&key, &patch).await {
                Ok(()) => debug!("Notified {} of update", key),
                Err(e) => warn!(
                    "External notify via {} failed for {}: {}",
                    backends.notifier.channel_name(),
                    key,
                    e
                ),
            }
        });
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("notifier", &self.notifier.channel_name())
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
