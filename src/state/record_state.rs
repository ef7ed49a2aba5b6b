/// Record state definitions for the checkpoint engine
///
/// A record starts `Pending`, is either skipped straight to `Succeeded` (its
/// row is already done) or moves to `InProgress` for an attempt. A failed
/// attempt leaves it `FailedRetryable` until the attempt limit turns it into
/// `FailedTerminal`.
use std::fmt;

/// Represents the current state of a record in the checkpoint engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordState {
    /// Record has not been looked at yet
    Pending,

    /// An extraction attempt is running
    InProgress,

    /// Record was extracted, now or in an earlier run
    Succeeded,

    /// Last attempt failed and attempts remain
    FailedRetryable,

    /// Attempt limit reached without success
    FailedTerminal,
}

impl RecordState {
    /// Returns true if no further attempt will be made for this record
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedTerminal)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Succeeded)
                | (Self::InProgress, Self::Succeeded)
                | (Self::InProgress, Self::FailedRetryable)
                | (Self::InProgress, Self::FailedTerminal)
                | (Self::FailedRetryable, Self::InProgress)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::FailedRetryable => "failed_retryable",
            Self::FailedTerminal => "failed_terminal",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
