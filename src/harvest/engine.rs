//! Checkpoint and retry engine
//!
//! Processes one record at a time. A row already marked done is skipped
//! without touching the browser. Otherwise the record is attempted up to
//! `max_attempts` times, and after every attempt the row is written, the
//! workbook saved and the copy snapshot refreshed.

use super::HarvestSettings;
use crate::browser::{BrowserDriver, Locator, TabHandle, WaitCondition};
use crate::extract::{
    parse_detail, DetailFields, ExtractionError, ListingItem, DETAIL_READY_SELECTOR,
};
use crate::state::{RecordState, RunState};
use crate::storage::{
    ensure_partition, read_done, save_and_copy, write_outcome, RecordOutcome, SheetId, Snapshots,
    StorageResult, TabularStore, SENTINEL,
};
use crate::{HarvestError, Result};
use std::time::Instant;

/// Owns the workbook while a run writes to it
pub struct CheckpointEngine<S: TabularStore> {
    store: S,
    snapshots: Snapshots,
    sheet: Option<(u32, SheetId)>,
}

impl<S: TabularStore> CheckpointEngine<S> {
    pub fn new(store: S, snapshots: Snapshots) -> Self {
        Self {
            store,
            snapshots,
            sheet: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Saves the workbook and refreshes the copy snapshot
    pub fn persist(&mut self) -> StorageResult<()> {
        save_and_copy(&mut self.store, &self.snapshots)
    }

    /// Opens (creating on first use) the sheet of `partition` and makes it current
    pub fn open_partition(&mut self, partition: u32) -> StorageResult<SheetId> {
        tracing::info!("Opening sheet {}", partition);
        let sheet = ensure_partition(&mut self.store, partition)?;
        self.persist()?;
        self.sheet = Some((partition, sheet));
        Ok(sheet)
    }

    fn sheet_for(&mut self, partition: u32) -> StorageResult<SheetId> {
        match self.sheet {
            Some((current, sheet)) if current == partition => Ok(sheet),
            _ => self.open_partition(partition),
        }
    }

    /// Processes the record at the cursor's current position
    ///
    /// Returns the record's final state. Extraction failures are absorbed
    /// into the row and the error budget; only storage failures escape.
    pub async fn process_record<B: BrowserDriver>(
        &mut self,
        browser: &mut B,
        settings: &HarvestSettings,
        item: &ListingItem,
        state: &mut RunState,
    ) -> Result<RecordState> {
        let cursor = state.cursor;
        let sheet = self.sheet_for(cursor.partition_id)?;
        let started = Instant::now();
        let mut record_state = RecordState::Pending;

        tracing::info!("Record {} | Item {}", cursor.record_number, item.index + 1);

        if read_done(&self.store, sheet, cursor.row)?.is_done() {
            transition(&mut record_state, RecordState::Succeeded)?;
            state.tally.skipped += 1;
            tracing::info!("Record {} already extracted", cursor.record_number);
            return Ok(record_state);
        }

        let mut outcome = RecordOutcome::pending(cursor.page, cursor.record_number);

        for attempt in 1..=settings.max_attempts {
            transition(&mut record_state, RecordState::InProgress)?;
            tracing::debug!("Attempt {}/{}", attempt, settings.max_attempts);

            match attempt_record(browser, settings, item, &mut outcome).await {
                Ok(()) => {
                    outcome.mark_succeeded();
                    transition(&mut record_state, RecordState::Succeeded)?;
                }
                Err(e) => {
                    state.budget.record_failure();
                    tracing::warn!(
                        "Record {} attempt {}/{} failed: {}",
                        cursor.record_number,
                        attempt,
                        settings.max_attempts,
                        e
                    );
                    outcome.mark_failed(e.to_string());
                    let next = if attempt < settings.max_attempts {
                        RecordState::FailedRetryable
                    } else {
                        RecordState::FailedTerminal
                    };
                    transition(&mut record_state, next)?;
                }
            }

            write_outcome(&mut self.store, sheet, cursor.row, &outcome)?;
            self.persist()?;

            if record_state.is_terminal() {
                break;
            }
        }

        match record_state {
            RecordState::Succeeded => state.tally.extracted += 1,
            _ => state.tally.failed += 1,
        }

        tracing::info!(
            "Record {} {} in {:.2}s",
            cursor.record_number,
            record_state,
            started.elapsed().as_secs_f64()
        );

        Ok(record_state)
    }
}

fn transition(current: &mut RecordState, next: RecordState) -> Result<()> {
    if !current.can_transition_to(next) {
        return Err(HarvestError::InvalidTransition {
            from: *current,
            to: next,
        });
    }
    *current = next;
    Ok(())
}

/// One extraction attempt
///
/// The detail tab is closed before returning, whatever the outcome.
async fn attempt_record<B: BrowserDriver>(
    browser: &mut B,
    settings: &HarvestSettings,
    item: &ListingItem,
    outcome: &mut RecordOutcome,
) -> std::result::Result<(), ExtractionError> {
    let href = item
        .detail_href
        .as_deref()
        .ok_or(ExtractionError::MissingUrl)?;
    let url = settings
        .base_url
        .join(href)
        .map_err(|e| ExtractionError::InvalidUrl {
            href: href.to_string(),
            reason: e.to_string(),
        })?;
    outcome.url = url.to_string();

    let tab = browser.open_tab(url.as_str()).await?;
    let fields = read_detail(browser, settings, tab).await;
    let closed = browser.close_tab(tab).await;

    let fields = fields?;
    closed?;

    apply_fields(outcome, fields);
    Ok(())
}

async fn read_detail<B: BrowserDriver>(
    browser: &mut B,
    settings: &HarvestSettings,
    tab: TabHandle,
) -> std::result::Result<DetailFields, ExtractionError> {
    browser.switch_tab(tab).await?;

    let ready = Locator::css(DETAIL_READY_SELECTOR);
    if let Err(e) = browser
        .wait_for(&ready, WaitCondition::Present, settings.selector_timeout)
        .await
    {
        tracing::debug!("Detail page not ready: {}", e);
    }

    browser.strip_scripts().await?;
    tokio::time::sleep(settings.script_settle).await;

    let markup = browser.markup().await?;
    parse_detail(&markup)
}

fn apply_fields(outcome: &mut RecordOutcome, fields: DetailFields) {
    let or_sentinel = |value: Option<String>| value.unwrap_or_else(|| SENTINEL.to_string());

    if let Some(content) = fields.content {
        outcome.text = content.text;
        outcome.images = content.images;
        outcome.videos = content.videos;
        outcome.links = content.links;
    }
    outcome.company = or_sentinel(fields.company);
    outcome.address = or_sentinel(fields.address);
    outcome.website = or_sentinel(fields.website);
    outcome.logo = or_sentinel(fields.logo);
}
