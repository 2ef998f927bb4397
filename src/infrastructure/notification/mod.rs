//! Notification infrastructure module

mod notify_rust;

pub use notify_rust::{NotifyRustNotifier, APP_NAME};

use crate::application::ports::Notifier;

/// Create the desktop notifier for the current platform
pub fn create_notifier() -> Box<dyn Notifier> {
    Box::new(NotifyRustNotifier::new())
}
