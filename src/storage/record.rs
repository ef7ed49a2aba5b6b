//! Record rows
//!
//! One exhibitor occupies one row of its sheet. The helpers here translate
//! between [`RecordOutcome`] and the fixed column layout.

use crate::state::DoneFlag;
use crate::storage::{
    CellRef, CellValue, Column, SheetId, Snapshots, StorageResult, TabularStore,
};

/// Placeholder for a field that could not be extracted
pub const SENTINEL: &str = "\u{2717}";

/// Field values of one record row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub done: DoneFlag,
    pub page: u32,
    pub record_number: u64,
    pub text: String,
    pub images: String,
    pub videos: String,
    pub links: String,
    pub company: String,
    pub address: String,
    pub website: String,
    pub logo: String,
    pub url: String,
    pub error: Option<String>,
}

impl RecordOutcome {
    /// A record whose fields have not been extracted yet
    pub fn pending(page: u32, record_number: u64) -> Self {
        Self {
            done: DoneFlag::Unset,
            page,
            record_number,
            text: SENTINEL.to_string(),
            images: SENTINEL.to_string(),
            videos: SENTINEL.to_string(),
            links: SENTINEL.to_string(),
            company: SENTINEL.to_string(),
            address: SENTINEL.to_string(),
            website: SENTINEL.to_string(),
            logo: SENTINEL.to_string(),
            url: SENTINEL.to_string(),
            error: None,
        }
    }

    pub fn mark_succeeded(&mut self) {
        self.done = DoneFlag::Yes;
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.done = DoneFlag::No;
        self.error = Some(error.into());
    }

    fn cell(&self, column: Column) -> Option<CellValue> {
        let text = |value: &str| Some(CellValue::text(value));
        match column {
            Column::Done => self.done.as_cell().map(CellValue::text),
            Column::Page => Some(CellValue::Integer(i64::from(self.page))),
            Column::Number => Some(CellValue::Integer(self.record_number as i64)),
            Column::Text => text(&self.text),
            Column::Images => text(&self.images),
            Column::Videos => text(&self.videos),
            Column::Links => text(&self.links),
            Column::Company => text(&self.company),
            Column::Address => text(&self.address),
            Column::Website => text(&self.website),
            Column::Logo => text(&self.logo),
            Column::Url => text(&self.url),
            Column::Error => self.error.as_deref().map(CellValue::text),
            Column::Translated | Column::TextTranslated | Column::CompanyTranslated => None,
        }
    }
}

/// Opens the sheet for a partition, creating it on first use
///
/// The header row is rewritten every time, which is harmless.
pub fn ensure_partition<S: TabularStore + ?Sized>(
    store: &mut S,
    partition: u32,
) -> StorageResult<SheetId> {
    let name = partition.to_string();

    let sheet = if store.has_partition(&name)? {
        store.partition(&name)?
    } else {
        store.create_partition(&name)?
    };

    for column in Column::RECORD {
        store.write_cell(
            sheet,
            CellRef::new(column, 1),
            Some(CellValue::text(column.header())),
        )?;
    }

    Ok(sheet)
}

/// Reads the `done` flag of a row
pub fn read_done<S: TabularStore + ?Sized>(
    store: &S,
    sheet: SheetId,
    row: u32,
) -> StorageResult<DoneFlag> {
    let value = store.read_cell(sheet, CellRef::new(Column::Done, row))?;
    Ok(DoneFlag::from_cell(value.as_ref().and_then(CellValue::as_text)))
}

/// Reads a cell as text; integers are rendered, unset cells are `None`
pub fn read_text<S: TabularStore + ?Sized>(
    store: &S,
    sheet: SheetId,
    cell: CellRef,
) -> StorageResult<Option<String>> {
    Ok(store.read_cell(sheet, cell)?.map(|value| value.to_string()))
}

/// Writes every record column of a row
pub fn write_outcome<S: TabularStore + ?Sized>(
    store: &mut S,
    sheet: SheetId,
    row: u32,
    outcome: &RecordOutcome,
) -> StorageResult<()> {
    for column in Column::RECORD {
        store.write_cell(sheet, CellRef::new(column, row), outcome.cell(column))?;
    }
    Ok(())
}

/// Saves the store, then refreshes the copy snapshot from the saved file
pub fn save_and_copy<S: TabularStore + ?Sized>(
    store: &mut S,
    snapshots: &Snapshots,
) -> StorageResult<()> {
    store.save()?;
    snapshots.refresh_copy()
}
