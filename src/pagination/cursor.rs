//! Traversal cursor
//!
//! The cursor records the last consumed position: the page being walked, its
//! partition, the last record number handed out and that record's row.

use super::{last_record_of_page, partition_id, row_for, PaginationResult, ITEMS_PER_PAGE};

/// Current traversal position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub page: u32,
    pub partition_id: u32,
    pub record_number: u64,
    pub row: u32,
}

impl PaginationCursor {
    /// Positions the cursor just before the first card of `page`
    ///
    /// # Example
    ///
    /// ```
    /// use exhibitor_harvest::pagination::PaginationCursor;
    ///
    /// let cursor = PaginationCursor::at_page_start(150).unwrap();
    /// assert_eq!(cursor.partition_id, 1);
    /// assert_eq!(cursor.record_number, 1788);
    /// assert_eq!(cursor.row, 601);
    /// ```
    pub fn at_page_start(page: u32) -> PaginationResult<Self> {
        let partition_id = partition_id(page)?;
        let record_number = u64::from(page - 1) * ITEMS_PER_PAGE;
        let row = row_for(record_number, partition_id)?;

        Ok(Self {
            page,
            partition_id,
            record_number,
            row,
        })
    }

    /// Consumes one record slot
    ///
    /// Succeeded, skipped and failed records all take exactly one slot.
    pub fn advance(&mut self) -> PaginationResult<()> {
        let record_number = self.record_number + 1;
        self.row = row_for(record_number, self.partition_id)?;
        self.record_number = record_number;
        Ok(())
    }

    /// Moves to a newly landed page
    ///
    /// Record numbers are derived from the page, so a short page before it
    /// leaves its unused slots behind. Returns true when the page opened a
    /// new partition, in which case the row has been re-based for it.
    pub fn move_to_page(&mut self, page: u32) -> PaginationResult<bool> {
        let landed = Self::at_page_start(page)?;
        let rolled = landed.partition_id != self.partition_id;
        *self = landed;
        Ok(rolled)
    }

    /// Skips the slots of a page whose cards could not be read
    pub fn align_to_page_end(&mut self) -> PaginationResult<()> {
        let last = last_record_of_page(self.page);
        if last > self.record_number {
            self.row = row_for(last, self.partition_id)?;
            self.record_number = last;
        }
        Ok(())
    }
}
