//! Workbook schema definitions
//!
//! A workbook is a set of named sheets holding sparse cells, plus a log of
//! the runs that wrote to it.

/// SQL schema for the workbook
pub const SCHEMA_SQL: &str = r#"
-- Named partitions of the workbook, in creation order
CREATE TABLE IF NOT EXISTS sheets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Sparse cell storage; an absent row means the cell is unset
CREATE TABLE IF NOT EXISTS cells (
    sheet_id INTEGER NOT NULL REFERENCES sheets(id),
    row INTEGER NOT NULL,
    col INTEGER NOT NULL,
    value,
    PRIMARY KEY (sheet_id, row, col)
) WITHOUT ROWID;

-- Track scrape and translate runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    start_page INTEGER,
    end_page INTEGER,
    status TEXT NOT NULL,
    errors INTEGER NOT NULL DEFAULT 0,
    config_hash TEXT NOT NULL
);
"#;

/// Initializes the workbook schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
