//! Device record store port and its in-memory implementation

use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::state::{DevicePatch, DeviceRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("device not found: {0}")]
    NotFound(String),

    #[error("device already exists: {0}")]
    AlreadyExists(String),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Access to stored device records.
///
/// Updates are last-write-wins per field. Implementations must be safe to
/// call from many countdowns at once.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<DeviceRecord, StoreError>;

    /// Apply the fields present in `patch` and return the merged record.
    async fn update(&self, key: &str, patch: &DevicePatch) -> Result<DeviceRecord, StoreError>;

    async fn insert(&self, record: DeviceRecord) -> Result<DeviceRecord, StoreError>;

    async fn remove(&self, key: &str) -> Result<DeviceRecord, StoreError>;

    /// Records ordered by key, plus the total record count
    async fn list(&self, offset: usize, limit: usize) -> Result<(Vec<DeviceRecord>, usize), StoreError>;
}

/// Process-local store backed by an ordered map
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, DeviceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<DeviceRecord, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn update(&self, key: &str, patch: &DevicePatch) -> Result<DeviceRecord, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        record.apply(patch);
        debug!("Stored update for {}", key);
        Ok(record.clone())
    }

    async fn insert(&self, record: DeviceRecord) -> Result<DeviceRecord, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&record.key) {
            return Err(StoreError::AlreadyExists(record.key));
        }
        records.insert(record.key.clone(), record.clone());
        Ok(record)
    }

    async fn remove(&self, key: &str) -> Result<DeviceRecord, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<(Vec<DeviceRecord>, usize), StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let page = records.values().skip(offset).take(limit).cloned().collect();
        Ok((page, records.len()))
    }
}
