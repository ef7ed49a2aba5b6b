//! Run driver
//!
//! Walks the listing page by page, hands every card to the checkpoint
//! engine and opens a new sheet whenever the listing crosses a partition
//! boundary. The error budget is checked before each page and before each
//! navigation, so a tripped budget never moves the listing further.
//! Record numbers are derived from the page, so a page never records more
//! than `ITEMS_PER_PAGE` cards.

use super::engine::CheckpointEngine;
use super::navigation::{go_to_page, PageTarget};
use super::{HarvestSettings, RunOutcome, RunReport};
use crate::browser::{BrowserDriver, Locator, WaitCondition};
use crate::extract::{parse_listing, LISTING_READY_SELECTORS};
use crate::pagination::ITEMS_PER_PAGE;
use crate::state::{ErrorBudget, RunState};
use crate::storage::{RunKind, RunStatus, Snapshots, TabularStore};
use crate::{HarvestError, Result};

/// Drives a browser over the listing and records into a workbook
pub struct Harvester<B: BrowserDriver, S: TabularStore> {
    browser: B,
    engine: CheckpointEngine<S>,
    settings: HarvestSettings,
    config_hash: String,
}

impl<B: BrowserDriver, S: TabularStore> Harvester<B, S> {
    pub fn new(
        browser: B,
        store: S,
        snapshots: Snapshots,
        settings: HarvestSettings,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            browser,
            engine: CheckpointEngine::new(store, snapshots),
            settings,
            config_hash: config_hash.into(),
        }
    }

    pub fn store(&self) -> &S {
        self.engine.store()
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Releases the browser and the workbook
    pub fn into_parts(self) -> (B, S) {
        (self.browser, self.engine.into_store())
    }

    /// Closes the workbook and ends the browser session
    pub async fn shutdown(self) -> Result<()> {
        let (browser, store) = self.into_parts();
        store.close()?;
        browser.quit().await?;
        Ok(())
    }

    /// Scrapes pages `start..=end` with a fresh error budget
    pub async fn run(&mut self, start: u32, end: u32) -> Result<RunReport> {
        let budget = ErrorBudget::new(self.settings.error_budget);
        self.run_with_budget(start, end, budget).await
    }

    /// Scrapes pages `start..=end` charging failures to `budget`
    pub async fn run_with_budget(
        &mut self,
        start: u32,
        end: u32,
        budget: ErrorBudget,
    ) -> Result<RunReport> {
        if start < 1 || end < start {
            return Err(HarvestError::InvalidRange { start, end });
        }

        tracing::info!("Scraping pages from {} to {}", start, end);

        self.engine.snapshots().take_backup()?;
        let run_id = self.engine.store_mut().begin_run(
            RunKind::Scrape,
            Some((start, end)),
            &self.config_hash,
        )?;
        self.engine.persist()?;

        let mut failures = budget.failures();
        let result = self.traverse(run_id, start, end, budget, &mut failures).await;

        let status = match &result {
            Ok(report) => report.outcome.status(),
            Err(_) => RunStatus::Failed,
        };
        let finished = self
            .engine
            .store_mut()
            .finish_run(run_id, status, failures)
            .and_then(|_| self.engine.persist());

        match (result, finished) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), finished) => {
                if let Err(log_error) = finished {
                    tracing::warn!("Failed to record run outcome: {}", log_error);
                }
                Err(e)
            }
        }
    }

    async fn traverse(
        &mut self,
        run_id: i64,
        start: u32,
        end: u32,
        budget: ErrorBudget,
        failures: &mut u32,
    ) -> Result<RunReport> {
        let listing = self.settings.listing_url.to_string();
        self.browser.navigate(&listing, self.settings.settle).await?;

        let first_page =
            go_to_page(&mut self.browser, &self.settings, PageTarget::Exact(start)).await?;
        let mut state = RunState::starting_at(first_page, budget)?;
        self.engine.open_partition(state.cursor.partition_id)?;

        let outcome = loop {
            if state.budget.is_exhausted() {
                break RunOutcome::StoppedDueToErrors;
            }

            tracing::info!("Page {}", state.cursor.page);

            let page_result = self.harvest_page(&mut state).await;
            *failures = state.budget.failures();

            match page_result {
                Ok(()) => {}
                Err(HarvestError::EmptyPage { page }) => {
                    tracing::warn!("Cards not found on page {}", page);
                    state.tally.empty_pages += 1;
                    state.cursor.align_to_page_end()?;
                }
                Err(e) => return Err(e),
            }

            if state.cursor.page >= end {
                break RunOutcome::Completed;
            }
            if state.budget.is_exhausted() {
                break RunOutcome::StoppedDueToErrors;
            }

            let current = state.cursor.page;
            let landed =
                go_to_page(&mut self.browser, &self.settings, PageTarget::Next { current }).await?;
            if state.cursor.move_to_page(landed)? {
                self.engine.open_partition(state.cursor.partition_id)?;
            }
        };

        match outcome {
            RunOutcome::Completed => tracing::info!("Execution completed"),
            RunOutcome::StoppedDueToErrors => tracing::warn!("Execution stopped due to errors"),
        }

        Ok(RunReport {
            run_id,
            outcome,
            first_page,
            cursor: state.cursor,
            tally: state.tally,
            failures: state.budget.failures(),
        })
    }

    /// Processes every card of the current listing page
    async fn harvest_page(&mut self, state: &mut RunState) -> Result<()> {
        for selector in LISTING_READY_SELECTORS {
            let locator = Locator::css(selector);
            if let Err(e) = self
                .browser
                .wait_for(&locator, WaitCondition::Present, self.settings.selector_timeout)
                .await
            {
                tracing::debug!("Listing not ready: {}", e);
            }
        }

        let markup = self.browser.markup().await?;
        let items = parse_listing(&markup);
        if items.is_empty() {
            return Err(HarvestError::EmptyPage {
                page: state.cursor.page,
            });
        }

        tracing::debug!("{} cards on page {}", items.len(), state.cursor.page);

        let capacity = ITEMS_PER_PAGE as usize;
        if items.len() > capacity {
            let overflow = items.len() - capacity;
            tracing::warn!(
                "Page {} lists {} cards; the last {} do not fit the page and are not recorded",
                state.cursor.page,
                items.len(),
                overflow
            );
            state.tally.overflow_cards += overflow as u64;
        }

        for item in items.iter().take(capacity) {
            state.cursor.advance()?;
            self.engine
                .process_record(&mut self.browser, &self.settings, item, state)
                .await?;
        }

        Ok(())
    }
}
