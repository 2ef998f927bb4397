//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: the HTTP
//! transcription service client, the XDG config file, and desktop notifications.

pub mod config;
pub mod notification;
pub mod transport;

// Re-export adapters
pub use config::XdgConfigStore;
pub use notification::{create_notifier, NotifyRustNotifier};
pub use transport::HttpJobTransport;
