//! External collaborator module
//!
//! The record store and the outbound notifier, behind traits so the timer
//! logic can be driven against any implementation.

pub mod backends;
pub mod notifier;
pub mod store;

// Re-export main types
pub use backends::Backends;
pub use notifier::{HttpNotifier, LogNotifier, Notifier, NotifyError};
pub use store::{MemoryStore, RecordStore, StoreError};
