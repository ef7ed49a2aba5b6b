//! Storage module for the scrape workbook
//!
//! This module handles every persisted artifact of a run:
//! - The SQLite-backed workbook (sheets of sparse cells)
//! - The fixed column layout of record rows
//! - Backup and copy snapshots of the workbook file
//! - Run tracking for resumption and reporting

mod record;
mod schema;
mod snapshot;
mod sqlite;
mod traits;

pub use record::{
    ensure_partition, read_done, read_text, save_and_copy, write_outcome, RecordOutcome, SENTINEL,
};
pub use snapshot::Snapshots;
pub use sqlite::SqliteWorkbook;
pub use traits::{StorageError, StorageResult, TabularStore};

use std::fmt;
use std::path::Path;

/// Opens or creates the workbook at `path`
pub fn open_workbook(path: &Path) -> StorageResult<SqliteWorkbook> {
    SqliteWorkbook::open(path)
}

/// Handle of a sheet inside a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetId(pub i64);

/// Value held by a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Integer(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Integer(number) => write!(f, "{}", number),
        }
    }
}

/// Columns of a record row, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Done,
    Page,
    Number,
    Text,
    Images,
    Videos,
    Links,
    Company,
    Address,
    Website,
    Logo,
    Url,
    Error,
    Translated,
    TextTranslated,
    CompanyTranslated,
}

impl Column {
    /// The fixed 13-column header written by the scraper
    pub const RECORD: [Column; 13] = [
        Column::Done,
        Column::Page,
        Column::Number,
        Column::Text,
        Column::Images,
        Column::Videos,
        Column::Links,
        Column::Company,
        Column::Address,
        Column::Website,
        Column::Logo,
        Column::Url,
        Column::Error,
    ];

    /// Columns appended by the translation pass
    pub const TRANSLATION: [Column; 3] = [
        Column::Translated,
        Column::TextTranslated,
        Column::CompanyTranslated,
    ];

    /// 1-based column index
    pub fn index(&self) -> u32 {
        *self as u32 + 1
    }

    /// Spreadsheet-style column letter
    pub fn letter(&self) -> char {
        (b'A' + *self as u8) as char
    }

    /// Header label written in row 1
    pub fn header(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Page => "page",
            Self::Number => "number",
            Self::Text => "text",
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Links => "links",
            Self::Company => "company",
            Self::Address => "address",
            Self::Website => "website",
            Self::Logo => "logo",
            Self::Url => "url",
            Self::Error => "error",
            Self::Translated => "translated",
            Self::TextTranslated => "text_translated",
            Self::CompanyTranslated => "company_translated",
        }
    }
}

/// Address of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub column: Column,
}

impl CellRef {
    pub fn new(column: Column, row: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column.letter(), self.row)
    }
}

/// Kind of run recorded in the run log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Scrape,
    Translate,
}

impl RunKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Translate => "translate",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "scrape" => Some(Self::Scrape),
            "translate" => Some(Self::Translate),
            _ => None,
        }
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    StoppedDueToErrors,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::StoppedDueToErrors => "stopped_due_to_errors",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "stopped_due_to_errors" => Some(Self::StoppedDueToErrors),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Represents a run in the run log
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub kind: RunKind,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub status: RunStatus,
    pub errors: u32,
    pub config_hash: String,
}
