//! Countdown handle and its externally visible state

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Mutex, PoisonError,
};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::utils::format_hhmm;

/// Lifecycle of one countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl TimerPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerPhase::Completed | TimerPhase::Cancelled)
    }
}

/// In-memory state of one armed countdown.
///
/// Shared between the registry and the tick loop that owns the countdown.
/// The cancel flag only ever goes from `false` to `true`.
#[derive(Debug)]
pub struct TimerHandle {
    key: String,
    id: u64,
    total_seconds: i64,
    remaining: AtomicI64,
    phase: Mutex<TimerPhase>,
    cancel_tx: watch::Sender<bool>,
}

impl TimerHandle {
    pub fn new(key: impl Into<String>, id: u64, total_seconds: i64) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            key: key.into(),
            id,
            total_seconds,
            remaining: AtomicI64::new(total_seconds),
            phase: Mutex::new(TimerPhase::Idle),
            cancel_tx,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Registry-unique id, distinguishes successive handles for one key
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn total_seconds(&self) -> i64 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.remaining.load(Ordering::Acquire)
    }

    pub(crate) fn set_remaining(&self, seconds: i64) {
        self.remaining.store(seconds, Ordering::Release);
    }

    pub fn phase(&self) -> TimerPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` unless the handle already reached a terminal phase.
    pub(crate) fn transition(&self, next: TimerPhase) -> TimerPhase {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if !phase.is_terminal() {
            *phase = next;
        }
        *phase
    }

    /// Signal the tick loop to stop. Does not wait for it.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
        self.transition(TimerPhase::Cancelled);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel_tx.subscribe();
        // The sender lives as long as `self`, so this only returns once the flag is set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    pub fn status(&self) -> TimerStatus {
        let remaining = self.remaining_seconds().max(0);
        TimerStatus {
            key: self.key.clone(),
            active: !self.phase().is_terminal(),
            phase: Some(self.phase()),
            remaining_seconds: Some(remaining),
            timer_remaining: format_hhmm(remaining).ok(),
        }
    }
}

/// Snapshot of the countdown for one key, as reported over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStatus {
    pub key: String,
    pub active: bool,
    pub phase: Option<TimerPhase>,
    pub remaining_seconds: Option<i64>,
    pub timer_remaining: Option<String>,
}

impl TimerStatus {
    /// Status of a key with no countdown
    pub fn inactive(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            active: false,
            phase: None,
            remaining_seconds: None,
            timer_remaining: None,
        }
    }
}
