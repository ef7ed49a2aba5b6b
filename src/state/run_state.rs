//! Run-wide traversal state
//!
//! Everything that a run mutates between records lives in [`RunState`], which
//! the run driver hands to each traversal step.

use crate::pagination::{PaginationCursor, PaginationResult};

/// Run-wide circuit breaker
///
/// Counts every failed extraction attempt across all records of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBudget {
    failures: u32,
    threshold: u32,
}

impl ErrorBudget {
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: 0,
            threshold,
        }
    }

    /// Creates a budget that has already absorbed `failures` failures
    pub fn with_failures(threshold: u32, failures: u32) -> Self {
        Self {
            failures,
            threshold,
        }
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns true once the failure count has reached the threshold
    pub fn is_exhausted(&self) -> bool {
        self.failures >= self.threshold
    }
}

/// Per-run record counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    pub extracted: u64,
    pub skipped: u64,
    pub failed: u64,
    pub empty_pages: u32,
    /// Cards beyond the page capacity, left unrecorded
    pub overflow_cards: u64,
}

/// Traversal state threaded through every step of a run
#[derive(Debug, Clone)]
pub struct RunState {
    pub cursor: PaginationCursor,
    pub budget: ErrorBudget,
    pub tally: RunTally,
}

impl RunState {
    /// Starts a run on the page the browser actually landed on
    pub fn starting_at(page: u32, budget: ErrorBudget) -> PaginationResult<Self> {
        Ok(Self {
            cursor: PaginationCursor::at_page_start(page)?,
            budget,
            tally: RunTally::default(),
        })
    }
}
