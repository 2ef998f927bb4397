//! Resolved meeting minutes

/// Final result of a completed job, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minutes {
    /// Raw transcript text
    pub transcript: String,
    /// Minutes text to display
    pub minutes: String,
    /// True when the server produced no usable minutes and the transcript is shown instead
    pub used_fallback: bool,
}

impl Minutes {
    /// Resolve the text to display.
    ///
    /// Server minutes are used when present and not blank; otherwise the
    /// transcript stands in for them and the fallback is flagged.
    pub fn resolve(transcript: impl Into<String>, minutes: impl Into<String>) -> Self {
        let transcript = transcript.into();
        let minutes = minutes.into();

        if minutes.trim().is_empty() {
            Self {
                minutes: transcript.clone(),
                transcript,
                used_fallback: true,
            }
        } else {
            Self {
                transcript,
                minutes,
                used_fallback: false,
            }
        }
    }
}
