//! Background tasks module
//!
//! This module contains the countdown tasks that run alongside the HTTP server.

pub mod countdown;

// Re-export main types
pub use countdown::{CountdownOutcome, CountdownScheduler, TimerError, TICK_INTERVAL};
