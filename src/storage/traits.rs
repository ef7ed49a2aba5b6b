//! Storage traits and error types
//!
//! This module defines the trait interface for the tabular store and its
//! associated error types.

use crate::storage::{CellRef, CellValue, RunKind, RunRecord, RunStatus, SheetId};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheet already exists: {0}")]
    SheetExists(String),

    #[error("Snapshot of {path} failed: {source}")]
    Snapshot {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the persisted tabular store
///
/// Writes are buffered until [`TabularStore::save`]; only saved state
/// survives a crash or a [`TabularStore::close`].
pub trait TabularStore {
    // ===== Sheets =====

    /// Returns true if a sheet with the given name exists
    fn has_partition(&self, name: &str) -> StorageResult<bool>;

    /// Creates a new, empty sheet
    fn create_partition(&mut self, name: &str) -> StorageResult<SheetId>;

    /// Gets the handle of an existing sheet
    fn partition(&self, name: &str) -> StorageResult<SheetId>;

    /// Lists all sheets in creation order
    fn partitions(&self) -> StorageResult<Vec<(SheetId, String)>>;

    // ===== Cells =====

    /// Reads a cell; `None` when the cell is unset
    fn read_cell(&self, sheet: SheetId, cell: CellRef) -> StorageResult<Option<CellValue>>;

    /// Writes a cell; `None` unsets it
    fn write_cell(
        &mut self,
        sheet: SheetId,
        cell: CellRef,
        value: Option<CellValue>,
    ) -> StorageResult<()>;

    /// Returns the highest row holding any cell, 0 for an empty sheet
    fn max_row(&self, sheet: SheetId) -> StorageResult<u32>;

    // ===== Persistence =====

    /// Persists every buffered write to disk
    fn save(&mut self) -> StorageResult<()>;

    /// Closes the store, discarding unsaved writes
    fn close(self) -> StorageResult<()>
    where
        Self: Sized;

    // ===== Run Tracking =====

    /// Records the start of a run and returns its ID
    fn begin_run(
        &mut self,
        kind: RunKind,
        pages: Option<(u32, u32)>,
        config_hash: &str,
    ) -> StorageResult<i64>;

    /// Records the final status of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, errors: u32) -> StorageResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
