//! Job value objects and entity

mod entity;
mod id;
mod minutes;
mod status;

pub use entity::Job;
pub use id::JobId;
pub use minutes::Minutes;
pub use status::{JobReceipt, JobSnapshot, JobStatus};
