//! Pagination index
//!
//! Maps the listing site's page numbering onto the sheet-partitioned workbook.
//! Every function here is pure, so a resumed run derives exactly the same
//! sheet and row for a record as the run that first visited it.
//!
//! # Layout
//!
//! | Partition | Pages | Records | Rows |
//! |-----------|-------|---------|------|
//! | 0 | 1..=99 | 1..=1188 | 2..=1189 |
//! | p ≥ 1 | 100p..=100p+99 | see [`partition_bounds`] | 2..=1201 |
//!
//! Row 1 of every sheet holds the column header.

mod cursor;

pub use cursor::PaginationCursor;

use thiserror::Error;

/// Cards rendered on every listing page
pub const ITEMS_PER_PAGE: u64 = 12;

/// Pages stored in every sheet after the first one
pub const PAGES_PER_PARTITION: u32 = 100;

/// Pages stored in sheet 0; it rolls over at page 100, not page 101
pub const FIRST_PARTITION_PAGES: u32 = PAGES_PER_PARTITION - 1;

/// Errors raised by the pagination index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("Invalid page number: {0}")]
    InvalidPage(u32),

    #[error("Record {record} does not belong to partition {partition}")]
    RecordOutOfPartition { record: u64, partition: u32 },
}

/// Result type for pagination operations
pub type PaginationResult<T> = Result<T, PaginationError>;

/// Returns the partition (sheet) a listing page is stored in
///
/// Pages below 100 live in partition 0; from there on every block of 100
/// pages gets its own partition.
///
/// # Example
///
/// ```
/// use exhibitor_harvest::pagination::partition_id;
///
/// assert_eq!(partition_id(99).unwrap(), 0);
/// assert_eq!(partition_id(100).unwrap(), 1);
/// assert_eq!(partition_id(250).unwrap(), 2);
/// assert!(partition_id(0).is_err());
/// ```
pub fn partition_id(page: u32) -> PaginationResult<u32> {
    if page == 0 {
        return Err(PaginationError::InvalidPage(page));
    }

    if page < PAGES_PER_PARTITION {
        Ok(0)
    } else {
        Ok(page / PAGES_PER_PARTITION)
    }
}

/// Returns true when arriving at `page` opens a new partition
pub fn is_rollover_boundary(page: u32) -> bool {
    page != 0 && page % PAGES_PER_PARTITION == 0
}

/// Returns the first and last record numbers stored in a partition
pub fn partition_bounds(partition: u32) -> (u64, u64) {
    let first_partition_records = u64::from(FIRST_PARTITION_PAGES) * ITEMS_PER_PAGE;
    let partition_records = u64::from(PAGES_PER_PARTITION) * ITEMS_PER_PAGE;

    if partition == 0 {
        (1, first_partition_records)
    } else {
        let before = first_partition_records + partition_records * (u64::from(partition) - 1);
        (before + 1, before + partition_records)
    }
}

/// Returns the number of the last record rendered on `page`
pub fn last_record_of_page(page: u32) -> u64 {
    u64::from(page) * ITEMS_PER_PAGE
}

/// Maps a record number to its absolute row inside its partition
///
/// Records up to 99 sit at `record + 1`, directly below the header. In later
/// partitions the row counter is re-based so that the first record of the
/// partition lands on row 2 again:
/// `row = record − (12·99 + 12·100·(partition − 1) − 1)`.
///
/// Partition 0 keeps `record + 1` for all of its records (1..=1188), which
/// keeps rows 2..=1189 contiguous.
///
/// The position just before a partition's first record is accepted and maps
/// to row 1, which is where a cursor sits before it consumes the first card.
pub fn row_for(record: u64, partition: u32) -> PaginationResult<u32> {
    let (first, last) = partition_bounds(partition);

    if record + 1 < first || record > last {
        return Err(PaginationError::RecordOutOfPartition { record, partition });
    }

    let row = if record <= 99 || partition == 0 {
        record + 1
    } else {
        let first_partition_records = u64::from(FIRST_PARTITION_PAGES) * ITEMS_PER_PAGE;
        let partition_records = u64::from(PAGES_PER_PARTITION) * ITEMS_PER_PAGE;
        record - (first_partition_records + partition_records * (u64::from(partition) - 1) - 1)
    };

    u32::try_from(row).map_err(|_| PaginationError::RecordOutOfPartition { record, partition })
}
