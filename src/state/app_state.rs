//! Main application state management

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{info, warn};

use super::{DevicePage, DevicePatch, DeviceRecord, TimerRegistry, TimerStatus};
use crate::{error::DeviceError, services::Backends, tasks::CountdownScheduler, utils::parse_hhmm};

/// Largest page size accepted by [`AppState::list_devices`]
pub const MAX_PAGE_SIZE: usize = 100;

/// Main application state: device operations over the store, notifier and timers
#[derive(Debug)]
pub struct AppState {
    pub backends: Backends,
    pub scheduler: CountdownScheduler,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create an AppState with a fresh timer registry
    pub fn new(port: u16, host: String, backends: Backends) -> Self {
        let scheduler = CountdownScheduler::new(Arc::new(TimerRegistry::new()), backends.clone());
        Self {
            backends,
            scheduler,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Merge a partial update into the stored record and re-arm the timer if
    /// the update carries `timerRemaining`.
    ///
    /// A malformed `timerRemaining` is dropped from the merge and reported as
    /// `InvalidFormat` after the remaining fields are stored. The countdown
    /// itself keeps running after this returns.
    pub async fn reconcile(&self, key: &str, mut patch: DevicePatch) -> Result<DeviceRecord, DeviceError> {
        patch.check_schema().map_err(DeviceError::InvalidFormat)?;
        let current = self.backends.store().get(key).await?;

        let duration = patch.timer_remaining.as_deref().map(parse_hhmm);
        if let Some(Err(e)) = &duration {
            warn!("Ignoring timerRemaining for {}: {}", key, e);
            patch.timer_remaining = None;
        }

        let merged = if patch.is_empty() {
            current
        } else {
            let merged = self.backends.persist(key, &patch).await?;
            info!("Updated {} with: {}", key, serde_json::to_string(&patch).unwrap_or_default());
            self.backends.notify_detached(key, patch);
            merged
        };

        match duration {
            Some(Ok(seconds)) => {
                if let Some(handle) = self.scheduler.start(key, seconds).await? {
                    // A concurrent delete may have removed the record after the merge.
                    if let Err(e) = self.backends.store().get(key).await {
                        self.scheduler.discard(&handle);
                        return Err(e.into());
                    }
                }
            }
            Some(Err(e)) => return Err(e.into()),
            None => {}
        }

        Ok(merged)
    }

    /// Register a new device with default field values
    pub async fn create_device(&self, key: &str) -> Result<DeviceRecord, DeviceError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DeviceError::InvalidFormat("device key must not be empty".to_string()));
        }
        let record = self.backends.store().insert(DeviceRecord::new(key)).await?;
        info!("Created device {}", key);
        Ok(record)
    }

    pub async fn get_device(&self, key: &str) -> Result<DeviceRecord, DeviceError> {
        Ok(self.backends.store().get(key).await?)
    }

    /// One page of devices ordered by key; `page` starts at 1
    pub async fn list_devices(&self, page: usize, limit: usize) -> Result<DevicePage, DeviceError> {
        if page == 0 {
            return Err(DeviceError::InvalidFormat("page starts at 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(DeviceError::InvalidFormat(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let offset = (page - 1).saturating_mul(limit);
        let (data, total) = self.backends.store().list(offset, limit).await?;
        Ok(DevicePage {
            data,
            total,
            page,
            last_page: total.div_ceil(limit),
        })
    }

    /// Remove a device and cancel its countdown.
    ///
    /// The timer is cancelled on both sides of the removal so a countdown
    /// armed by an update racing the delete does not outlive the record.
    pub async fn delete_device(&self, key: &str) -> Result<(), DeviceError> {
        let mut cleared = self.scheduler.cancel(key);
        self.backends.store().remove(key).await?;
        cleared |= self.scheduler.cancel(key);
        if cleared {
            info!("Cleared timer for deleted device {}", key);
        }
        info!("Deleted device {}", key);
        Ok(())
    }

    /// Record that the device is alive
    pub async fn heartbeat(&self, key: &str) -> Result<DeviceRecord, DeviceError> {
        let now = Utc::now();
        let record = self.backends.persist(key, &DevicePatch::heartbeat(now)).await?;
        info!("Updated heartbeat for {} at {}", key, now.to_rfc3339());
        Ok(record)
    }

    /// Live countdown state for an existing device
    pub async fn timer_status(&self, key: &str) -> Result<TimerStatus, DeviceError> {
        self.backends.store().get(key).await?;
        Ok(self
            .scheduler
            .registry()
            .get(key)
            .map(|handle| handle.status())
            .unwrap_or_else(|| TimerStatus::inactive(key)))
    }

    pub fn active_timers(&self) -> usize {
        self.scheduler.registry().len()
    }

    /// Cancel every running countdown, returning how many were stopped
    pub fn shutdown(&self) -> usize {
        let cancelled = self.scheduler.registry().cancel_all();
        if cancelled > 0 {
            info!("Cancelled {} running timers", cancelled);
        }
        cancelled
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
