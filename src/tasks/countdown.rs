//! Per-device countdown background task
//!
//! Every armed timer gets its own task that ticks once per second. Progress
//! is written back and announced only at sync points (each whole minute,
//! then every ten seconds in the final minute), and the countdown ends with
//! exactly one completion write that switches the motor off.

use std::{
    panic::AssertUnwindSafe,
    sync::Arc,
    time::Duration,
};

use chrono::Utc;
use futures::FutureExt;
use thiserror::Error;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use crate::{
    services::Backends,
    state::{DevicePatch, TimerHandle, TimerPhase, TimerRegistry},
    utils::{format_hhmm, DurationError},
};

/// Time between two ticks of a countdown
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TimerError {
    #[error(transparent)]
    Duration(#[from] DurationError),

    #[error("countdown for {key} faulted: {reason}")]
    Fault { key: String, reason: String },
}

/// How a tick loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Completed,
    Cancelled,
}

/// Whether the countdown writes and announces its progress at `remaining`.
pub fn is_sync_point(remaining: i64) -> bool {
    remaining > 0 && (remaining % 60 == 0 || (remaining <= 60 && remaining % 10 == 0))
}

/// Starts, supersedes and runs countdowns
#[derive(Debug, Clone)]
pub struct CountdownScheduler {
    registry: Arc<TimerRegistry>,
    backends: Backends,
}

impl CountdownScheduler {
    pub fn new(registry: Arc<TimerRegistry>, backends: Backends) -> Self {
        Self { registry, backends }
    }

    pub fn registry(&self) -> &Arc<TimerRegistry> {
        &self.registry
    }

    /// Arm a countdown of `total_seconds` for `key`.
    ///
    /// A non-positive duration cancels whatever runs for `key`, writes the
    /// finished state straight away and returns `None`. Otherwise the new
    /// handle is registered, `lastTimerTime` is stored and the start is
    /// announced before this returns. Only the tick loop runs detached.
    pub async fn start(
        &self,
        key: &str,
        total_seconds: i64,
    ) -> Result<Option<Arc<TimerHandle>>, TimerError> {
        if total_seconds <= 0 {
            if let Some(previous) = self.registry.cancel(key) {
                info!("Zero timer for {} cancelled running timer {}", key, previous.id());
            }
            info!("Timer is zero, no countdown for {}", key);
            if let Err(e) = self.backends.persist(key, &DevicePatch::timer_finished(Utc::now())).await {
                warn!("Failed to store stopped timer for {}: {}", key, e);
            }
            return Ok(None);
        }

        // Fail before arming if the countdown could never be displayed.
        let display = format_hhmm(total_seconds)?;

        let handle = Arc::new(TimerHandle::new(key, self.registry.next_id(), total_seconds));
        if let Some(previous) = self.registry.arm(Arc::clone(&handle)) {
            info!("Replacing timer {} for {}", previous.id(), key);
        }
        info!("Starting timer {} for {}: {}s", handle.id(), key, total_seconds);

        let started_at = Utc::now();
        let announced = DevicePatch::timer_sync(display, started_at);
        self.sync(&handle, &DevicePatch::timer_started(started_at), &announced).await;

        let scheduler = self.clone();
        let task_handle = Arc::clone(&handle);
        tokio::spawn(async move {
            scheduler.supervise(task_handle).await;
        });

        Ok(Some(handle))
    }

    /// Cancel the countdown for `key`, if one is running
    pub fn cancel(&self, key: &str) -> bool {
        self.registry.cancel(key).is_some()
    }

    /// Stop `handle` and drop it from the registry unless it was already replaced
    pub fn discard(&self, handle: &TimerHandle) {
        handle.cancel();
        self.registry.release(handle);
    }

    /// Run the tick loop and clean up after it if it fails or panics.
    async fn supervise(self, handle: Arc<TimerHandle>) {
        let run = AssertUnwindSafe(self.run(&handle)).catch_unwind().await;

        let reason = match run {
            Ok(Ok(outcome)) => {
                debug!("Timer {} for {} ended: {:?}", handle.id(), handle.key(), outcome);
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "tick loop panicked".to_string(),
        };

        error!("Stopping timer {} for {}: {}", handle.id(), handle.key(), reason);
        self.discard(&handle);
    }

    async fn run(&self, handle: &TimerHandle) -> Result<CountdownOutcome, TimerError> {
        let key = handle.key();
        if handle.is_cancelled() {
            return Ok(CountdownOutcome::Cancelled);
        }
        handle.transition(TimerPhase::Running);

        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        let mut remaining = handle.total_seconds();

        loop {
            tokio::select! {
                biased;
                _ = handle.cancelled() => {
                    debug!("Timer {} for {} cancelled", handle.id(), key);
                    return Ok(CountdownOutcome::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            remaining -= 1;
            if remaining < 0 || remaining >= handle.total_seconds() {
                return Err(TimerError::Fault {
                    key: key.to_string(),
                    reason: format!("remaining {}s outside 0..{}", remaining, handle.total_seconds()),
                });
            }
            handle.set_remaining(remaining);

            if remaining == 0 {
                return Ok(self.complete(handle).await);
            }

            if is_sync_point(remaining) {
                let formatted = format_hhmm(remaining)?;
                let patch = DevicePatch::timer_sync(formatted.clone(), Utc::now());
                self.sync(handle, &patch, &patch).await;
                info!("Timer update for {}: {} ({}s left)", key, formatted, remaining);
            }
        }
    }

    /// Single terminal action of a countdown that ran out.
    async fn complete(&self, handle: &TimerHandle) -> CountdownOutcome {
        if handle.is_cancelled() {
            return CountdownOutcome::Cancelled;
        }
        info!("Timer completed for {}", handle.key());

        let patch = DevicePatch::timer_finished(Utc::now());
        self.sync(handle, &patch, &patch).await;

        handle.transition(TimerPhase::Completed);
        self.registry.release(handle);
        CountdownOutcome::Completed
    }

    /// Write `persist` then send `announce`, skipping whatever comes after a
    /// cancellation. Failures are logged and do not stop the countdown.
    async fn sync(&self, handle: &TimerHandle, persist: &DevicePatch, announce: &DevicePatch) {
        let key = handle.key();

        if handle.is_cancelled() {
            return;
        }
        if let Err(e) = self.backends.persist(key, persist).await {
            warn!("Failed to store timer progress for {}: {}", key, e);
        }

        if handle.is_cancelled() {
            return;
        }
        if let Err(e) = self.backends.notify(key, announce).await {
            warn!("Failed to notify timer progress for {}: {}", key, e);
        }
    }
}
