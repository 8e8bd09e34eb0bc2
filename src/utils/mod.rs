//! Utility functions module
//!
//! Duration string handling and process signal handling.

pub mod duration;
pub mod signals;

// Re-export main functions
pub use duration::{format_hhmm, parse_hhmm, DurationError};
pub use signals::shutdown_signal;
