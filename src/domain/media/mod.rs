//! Media files accepted for submission

mod media_file;

pub use media_file::{MediaFile, MediaType};
