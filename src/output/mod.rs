//! Output module for workbook reports
//!
//! This module handles:
//! - Counting record outcomes per sheet
//! - Printing the statistics shown by `--stats`

pub mod stats;

pub use stats::{load_statistics, print_statistics, SheetStatistics, WorkbookStatistics};
