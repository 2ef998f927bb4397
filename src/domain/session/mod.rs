//! Upload session state

mod progress;
mod upload_session;

pub use progress::Progress;
pub use upload_session::{
    InvalidStateTransition, JobOutcome, SessionSnapshot, UploadPhase, UploadSession,
};
