//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pump_timer::{
    services::{Backends, MemoryStore, Notifier, NotifyError, RecordStore, StoreError},
    state::{AppState, DevicePatch, DeviceRecord},
};
use serde_json::Value;
use tokio::sync::Semaphore;

/// Notifier that keeps every payload it was handed.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Value)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, topic: &str, payload: &Value) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((topic.to_string(), payload.clone()));
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

/// Memory store whose `remove` waits until [`GatedStore::open`] is called.
pub struct GatedStore {
    inner: MemoryStore,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn get(&self, key: &str) -> Result<DeviceRecord, StoreError> {
        self.inner.get(key).await
    }

    async fn update(&self, key: &str, patch: &DevicePatch) -> Result<DeviceRecord, StoreError> {
        self.inner.update(key, patch).await
    }

    async fn insert(&self, record: DeviceRecord) -> Result<DeviceRecord, StoreError> {
        self.inner.insert(record).await
    }

    async fn remove(&self, key: &str) -> Result<DeviceRecord, StoreError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.inner.remove(key).await
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<(Vec<DeviceRecord>, usize), StoreError> {
        self.inner.list(offset, limit).await
    }
}

pub fn app_state() -> (Arc<AppState>, Arc<RecordingNotifier>) {
    app_state_with(Arc::new(MemoryStore::new()))
}

pub fn app_state_with(store: Arc<dyn RecordStore>) -> (Arc<AppState>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let backends = Backends::new(store, notifier.clone(), "esp32");
    let state = Arc::new(AppState::new(3000, "127.0.0.1".to_string(), backends));
    (state, notifier)
}

/// Let detached tasks run; with a paused clock this also advances time.
pub async fn settle(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
