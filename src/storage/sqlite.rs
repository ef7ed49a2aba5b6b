//! SQLite workbook implementation
//!
//! This module provides a SQLite-based implementation of the TabularStore
//! trait. Writes are collected in an open transaction and committed by
//! `save()`, so the file on disk only ever holds saved state.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, TabularStore};
use crate::storage::{CellRef, CellValue, RunKind, RunRecord, RunStatus, SheetId};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite workbook backend
pub struct SqliteWorkbook {
    conn: Connection,
    path: PathBuf,
}

impl SqliteWorkbook {
    /// Opens the workbook at `path`, creating it if needed
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the workbook file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteWorkbook)` - Successfully opened/created workbook
    /// * `Err(StorageError)` - Failed to open workbook
    pub fn open(path: &Path) -> StorageResult<Self> {
        if path.exists() {
            tracing::info!("Opening workbook {}", path.display());
        } else {
            tracing::info!("Creating workbook {}", path.display());
        }

        let conn = Connection::open(path)?;

        // A committed rollback-journal database is a single self-contained
        // file, which is what the copy snapshot relies on.
        conn.execute_batch(
            "
            PRAGMA journal_mode = DELETE;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path of the workbook file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if there are writes not yet saved
    pub fn has_unsaved_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin_if_needed(&self) -> StorageResult<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
        }
        Ok(())
    }
}

fn cell_from_sql(value: Value) -> Option<CellValue> {
    match value {
        Value::Null => None,
        Value::Integer(number) => Some(CellValue::Integer(number)),
        Value::Real(number) => Some(CellValue::Text(number.to_string())),
        Value::Text(text) => Some(CellValue::Text(text)),
        Value::Blob(bytes) => Some(CellValue::Text(
            String::from_utf8_lossy(&bytes).into_owned(),
        )),
    }
}

fn cell_to_sql(value: CellValue) -> Value {
    match value {
        CellValue::Text(text) => Value::Text(text),
        CellValue::Integer(number) => Value::Integer(number),
    }
}

impl TabularStore for SqliteWorkbook {
    // ===== Sheets =====

    fn has_partition(&self, name: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sheets WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_partition(&mut self, name: &str) -> StorageResult<SheetId> {
        if self.has_partition(name)? {
            return Err(StorageError::SheetExists(name.to_string()));
        }

        tracing::info!("Creating sheet {}", name);
        self.begin_if_needed()?;
        self.conn.execute(
            "INSERT INTO sheets (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        Ok(SheetId(self.conn.last_insert_rowid()))
    }

    fn partition(&self, name: &str) -> StorageResult<SheetId> {
        self.conn
            .query_row(
                "SELECT id FROM sheets WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?
            .map(SheetId)
            .ok_or_else(|| StorageError::SheetNotFound(name.to_string()))
    }

    fn partitions(&self) -> StorageResult<Vec<(SheetId, String)>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM sheets ORDER BY id")?;

        let sheets = stmt
            .query_map([], |row| Ok((SheetId(row.get(0)?), row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sheets)
    }

    // ===== Cells =====

    fn read_cell(&self, sheet: SheetId, cell: CellRef) -> StorageResult<Option<CellValue>> {
        let value: Option<Value> = self
            .conn
            .query_row(
                "SELECT value FROM cells WHERE sheet_id = ?1 AND row = ?2 AND col = ?3",
                params![sheet.0, cell.row, cell.column.index()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value.and_then(cell_from_sql))
    }

    fn write_cell(
        &mut self,
        sheet: SheetId,
        cell: CellRef,
        value: Option<CellValue>,
    ) -> StorageResult<()> {
        self.begin_if_needed()?;

        match value {
            Some(value) => {
                self.conn.execute(
                    "INSERT INTO cells (sheet_id, row, col, value) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(sheet_id, row, col) DO UPDATE SET value = excluded.value",
                    params![sheet.0, cell.row, cell.column.index(), cell_to_sql(value)],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM cells WHERE sheet_id = ?1 AND row = ?2 AND col = ?3",
                    params![sheet.0, cell.row, cell.column.index()],
                )?;
            }
        }

        Ok(())
    }

    fn max_row(&self, sheet: SheetId) -> StorageResult<u32> {
        let max: Option<u32> = self.conn.query_row(
            "SELECT MAX(row) FROM cells WHERE sheet_id = ?1",
            params![sheet.0],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    // ===== Persistence =====

    fn save(&mut self) -> StorageResult<()> {
        if !self.conn.is_autocommit() {
            tracing::debug!("Saving workbook {}", self.path.display());
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn close(self) -> StorageResult<()> {
        tracing::info!("Closing workbook {}", self.path.display());

        if !self.conn.is_autocommit() {
            tracing::warn!("Discarding unsaved workbook changes");
            self.conn.execute_batch("ROLLBACK")?;
        }

        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }

    // ===== Run Tracking =====

    fn begin_run(
        &mut self,
        kind: RunKind,
        pages: Option<(u32, u32)>,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.begin_if_needed()?;
        self.conn.execute(
            "INSERT INTO runs (kind, started_at, start_page, end_page, status, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                kind.to_db_string(),
                now,
                pages.map(|(start, _)| start),
                pages.map(|(_, end)| end),
                RunStatus::Running.to_db_string(),
                config_hash
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, errors: u32) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.begin_if_needed()?;
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, errors = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, errors, run_id],
        )?;
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, started_at, finished_at, start_page, end_page, status, errors, config_hash
             FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    kind: RunKind::from_db_string(&row.get::<_, String>(1)?)
                        .unwrap_or(RunKind::Scrape),
                    started_at: row.get(2)?,
                    finished_at: row.get(3)?,
                    start_page: row.get(4)?,
                    end_page: row.get(5)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
                        .unwrap_or(RunStatus::Failed),
                    errors: row.get(7)?,
                    config_hash: row.get(8)?,
                })
            })
            .optional()?;

        Ok(run)
    }
}
