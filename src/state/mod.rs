//! State management module
//!
//! Device records, countdown handles, the registry that owns them, and the
//! application state tying them to the store and notifier.

pub mod app_state;
pub mod device;
pub mod registry;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use device::{DevicePage, DevicePatch, DeviceRecord, MotorState};
pub use registry::TimerRegistry;
pub use timer_state::{TimerHandle, TimerPhase, TimerStatus};
