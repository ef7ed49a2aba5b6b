//! Exhibitor-Harvest: a resumable exhibitor-list scraper
//!
//! This crate walks a paginated, JavaScript-rendered exhibitor listing with a
//! headless browser, extracts every exhibitor's detail page, and checkpoints
//! each record into a sheet-partitioned SQLite workbook so that an interrupted
//! run resumes without losing or duplicating work.

pub mod browser;
pub mod config;
pub mod extract;
pub mod harvest;
pub mod output;
pub mod pagination;
pub mod state;
pub mod storage;
pub mod translate;

use thiserror::Error;

/// Main error type for Exhibitor-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Pagination error: {0}")]
    Pagination(#[from] pagination::PaginationError),

    #[error("Translation error: {0}")]
    Translate(#[from] translate::TranslateError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Cards not found on page {page}")]
    EmptyPage { page: u32 },

    #[error("It was not possible to go to the page {page} after {attempts} attempts")]
    NavigationExhausted { page: u32, attempts: u32 },

    #[error("Invalid page range: {start}..={end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RecordState,
        to: state::RecordState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Exhibitor-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{Harvester, RunOutcome, RunReport};
pub use pagination::{partition_id, row_for, PaginationCursor};
pub use state::{DoneFlag, ErrorBudget, RecordState, RunState};
