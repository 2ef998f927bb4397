//! Transcription service transport

mod http;

pub use http::HttpJobTransport;
