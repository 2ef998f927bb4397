//! Meeting Minutes - upload recordings for transcription and minute generation
//!
//! This crate submits a meeting recording to a remote transcription service,
//! follows the resulting job until it finishes, and delivers the minutes.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the job and upload session state machines, and errors
//! - **Application**: Port interfaces (traits), the job poller, and the upload orchestrator
//! - **Infrastructure**: Adapter implementations (HTTP transport, XDG config, notifications)
//! - **CLI**: Command-line interface, console presentation, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
