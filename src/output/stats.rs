//! Statistics generation from a workbook
//!
//! This module provides functionality for summarizing record outcomes and
//! the latest run from the storage layer.

use crate::state::DoneFlag;
use crate::storage::{read_done, read_text, CellRef, Column, RunRecord, StorageResult, TabularStore};

/// Outcome counts of one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetStatistics {
    /// Sheet name, which is its partition number
    pub name: String,

    /// Record rows, the header excluded
    pub rows: u32,

    /// Rows marked done
    pub done: u32,

    /// Rows whose last attempt failed
    pub failed: u32,

    /// Rows without a done flag
    pub unset: u32,

    /// Rows marked translated
    pub translated: u32,
}

/// Workbook statistics summary
#[derive(Debug, Clone, Default)]
pub struct WorkbookStatistics {
    pub sheets: Vec<SheetStatistics>,
    pub latest_run: Option<RunRecord>,
}

impl WorkbookStatistics {
    pub fn total_rows(&self) -> u32 {
        self.sheets.iter().map(|s| s.rows).sum()
    }

    pub fn total_done(&self) -> u32 {
        self.sheets.iter().map(|s| s.done).sum()
    }

    pub fn total_failed(&self) -> u32 {
        self.sheets.iter().map(|s| s.failed).sum()
    }
}

/// Loads statistics from storage
pub fn load_statistics(store: &dyn TabularStore) -> StorageResult<WorkbookStatistics> {
    let mut sheets = Vec::new();

    for (sheet, name) in store.partitions()? {
        let max_row = store.max_row(sheet)?;
        let mut stats = SheetStatistics {
            name,
            rows: max_row.saturating_sub(1),
            ..SheetStatistics::default()
        };

        for row in 2..=max_row {
            match read_done(store, sheet, row)? {
                DoneFlag::Yes => stats.done += 1,
                DoneFlag::No => stats.failed += 1,
                DoneFlag::Unset => stats.unset += 1,
            }

            let translated = read_text(store, sheet, CellRef::new(Column::Translated, row))?;
            if DoneFlag::from_cell(translated.as_deref()).is_done() {
                stats.translated += 1;
            }
        }

        sheets.push(stats);
    }

    Ok(WorkbookStatistics {
        sheets,
        latest_run: store.latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &WorkbookStatistics) {
    println!("=== Workbook Statistics ===\n");

    println!("Overview:");
    println!("  Sheets: {}", stats.sheets.len());
    println!("  Records: {}", stats.total_rows());
    println!("  Done: {}", stats.total_done());
    println!("  Failed: {}", stats.total_failed());
    println!();

    if !stats.sheets.is_empty() {
        println!("Sheets:");
        for sheet in &stats.sheets {
            println!(
                "  {}: {} rows, {} done, {} failed, {} unset, {} translated",
                sheet.name, sheet.rows, sheet.done, sheet.failed, sheet.unset, sheet.translated
            );
        }
        println!();
    }

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  Id: {}", run.id);
        println!("  Kind: {}", run.kind.to_db_string());
        if let (Some(start), Some(end)) = (run.start_page, run.end_page) {
            println!("  Pages: {} to {}", start, end);
        }
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!("  Errors: {}", run.errors);
        println!();
    }

    let rows = stats.total_rows();
    let success_rate = if rows > 0 {
        (stats.total_done() as f64 / rows as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} records extracted)",
        success_rate,
        stats.total_done(),
        rows
    );
}
