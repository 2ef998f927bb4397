//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod events;
pub mod notifier;
pub mod transport;

// Re-export common types
pub use config::ConfigStore;
pub use events::UploadEvents;
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use transport::{JobTransport, TransportError};
