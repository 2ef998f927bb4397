//! Synthetic upload progress value object

use std::fmt;

/// Displayed upload percentage, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(100);

    /// Create a progress value, clamped to 100
    pub const fn new(percent: u8) -> Self {
        if percent > 100 {
            Self(100)
        } else {
            Self(percent)
        }
    }

    pub const fn percent(&self) -> u8 {
        self.0
    }

    /// Advance by `step`, never past `ceiling` and never backwards
    pub fn advance(self, step: u8, ceiling: u8) -> Self {
        let ceiling = ceiling.min(100);
        if self.0 >= ceiling {
            return self;
        }
        Self(self.0.saturating_add(step).min(ceiling))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
