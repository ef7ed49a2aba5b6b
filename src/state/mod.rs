//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `RecordState`: per-record checkpoint state machine
//! - `DoneFlag`: the persisted `done` column of a record row
//! - `ErrorBudget`: run-wide circuit breaker counting failed attempts
//! - `RunState`: cursor, budget and counters threaded through a run

mod done_flag;
mod record_state;
mod run_state;

// Re-export main types
pub use done_flag::DoneFlag;
pub use record_state::RecordState;
pub use run_state::{ErrorBudget, RunState, RunTally};
