/// The `done` column of a record row
use std::fmt;

/// Persisted completion marker of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoneFlag {
    /// Extraction succeeded; the row is never written again
    Yes,

    /// Last attempt failed; the row may be retried by a later run
    No,

    /// Row was never written
    Unset,
}

impl DoneFlag {
    pub fn from_cell(value: Option<&str>) -> Self {
        match value {
            Some("YES") => Self::Yes,
            Some("NO") => Self::No,
            _ => Self::Unset,
        }
    }

    /// Cell text, `None` for an unset flag
    pub fn as_cell(&self) -> Option<&'static str> {
        match self {
            Self::Yes => Some("YES"),
            Self::No => Some("NO"),
            Self::Unset => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl fmt::Display for DoneFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cell().unwrap_or("unset"))
    }
}
