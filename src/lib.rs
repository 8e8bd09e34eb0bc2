//! Pump Timer - per-device motor countdowns over HTTP
//!
//! Devices report partial state updates; an update carrying `timerRemaining`
//! arms a countdown that periodically writes its progress back, notifies an
//! external sink and finally switches the motor off.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::DeviceError;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
