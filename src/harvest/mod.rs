//! Harvest orchestration
//!
//! This module walks the listing and checkpoints every record:
//! - `engine`: per-record retry loop and row persistence
//! - `navigation`: moving the listing to a given or the next page
//! - `driver`: the page loop, partition rollover and the error budget

mod driver;
mod engine;
mod navigation;

pub use driver::Harvester;
pub use engine::CheckpointEngine;
pub use navigation::{go_to_page, PageTarget};

use crate::config::Config;
use crate::pagination::PaginationCursor;
use crate::state::RunTally;
use crate::storage::RunStatus;
use crate::Result;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Resolved settings of a harvest run
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Detail-page addresses are resolved against this
    pub base_url: Url,
    pub listing_url: Url,
    pub max_attempts: u32,
    pub error_budget: u32,
    pub navigation_retries: u32,
    pub navigation_backoff: Duration,
    pub settle: Duration,
    pub click_settle: Duration,
    pub script_settle: Duration,
    pub selector_timeout: Duration,
}

impl HarvestSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: config.site.base()?,
            listing_url: config.site.listing_url()?,
            max_attempts: config.run.max_attempts,
            error_budget: config.run.error_budget,
            navigation_retries: config.run.navigation_retries,
            navigation_backoff: config.run.navigation_backoff(),
            settle: config.browser.settle(),
            click_settle: config.browser.click_settle(),
            script_settle: config.browser.script_settle(),
            selector_timeout: config.browser.selector_timeout(),
        })
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The end page was processed
    Completed,
    /// The error budget ran out; the workbook is ready to resume from
    StoppedDueToErrors,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            Self::Completed => RunStatus::Completed,
            Self::StoppedDueToErrors => RunStatus::StoppedDueToErrors,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::StoppedDueToErrors => write!(f, "stopped due to errors"),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub outcome: RunOutcome,
    /// Page the listing actually started on
    pub first_page: u32,
    /// Position after the last consumed record
    pub cursor: PaginationCursor,
    pub tally: RunTally,
    /// Failed attempts counted against the error budget
    pub failures: u32,
}
