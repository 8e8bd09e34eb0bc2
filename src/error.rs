//! Errors surfaced to callers of device operations

use thiserror::Error;

use crate::{services::StoreError, tasks::TimerError, utils::DurationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("device not found: {0}")]
    NotFound(String),

    #[error("device already exists: {0}")]
    AlreadyExists(String),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DeviceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => DeviceError::NotFound(key),
            StoreError::AlreadyExists(key) => DeviceError::AlreadyExists(key),
            StoreError::Unavailable(reason) => DeviceError::Unavailable(reason),
        }
    }
}

impl From<DurationError> for DeviceError {
    fn from(e: DurationError) -> Self {
        DeviceError::InvalidFormat(e.to_string())
    }
}

impl From<TimerError> for DeviceError {
    fn from(e: TimerError) -> Self {
        match e {
            TimerError::Duration(e) => e.into(),
            fault @ TimerError::Fault { .. } => DeviceError::Unavailable(fault.to_string()),
        }
    }
}
