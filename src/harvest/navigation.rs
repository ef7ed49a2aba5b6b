//! Listing pager control
//!
//! The site's pager exposes a "next" control whose `data-page` attribute
//! names the page it leads to. Rewriting that attribute before clicking
//! jumps to an arbitrary page. Once a page is shown the control points at
//! the page after it, which is how the landed page is read back.

use super::HarvestSettings;
use crate::browser::{BrowserDriver, BrowserError, BrowserResult, Locator, WaitCondition};
use crate::extract::NEXT_PAGE_SELECTOR;
use crate::{HarvestError, Result};

/// Where the pager should take the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    /// Jump to the given page; the site clamps it to its last page
    Exact(u32),
    /// Follow the pager from the given page to the one after it
    Next { current: u32 },
}

impl PageTarget {
    fn requested(&self) -> u32 {
        match self {
            Self::Exact(page) => *page,
            Self::Next { current } => current + 1,
        }
    }
}

/// Moves the listing to `target` and returns the page landed on
///
/// Each failed attempt is followed by the configured back-off; running out
/// of attempts is fatal to the run.
pub async fn go_to_page<B: BrowserDriver>(
    browser: &mut B,
    settings: &HarvestSettings,
    target: PageTarget,
) -> Result<u32> {
    let attempts = settings.navigation_retries;

    for attempt in 1..=attempts {
        match click_pager(browser, settings, target).await {
            Ok(page) => return Ok(page),
            Err(e) => {
                tracing::warn!(
                    "Error going to page {} (attempt {}/{}): {}",
                    target.requested(),
                    attempt,
                    attempts,
                    e
                );
                if attempt < attempts {
                    tokio::time::sleep(settings.navigation_backoff).await;
                }
            }
        }
    }

    Err(HarvestError::NavigationExhausted {
        page: target.requested(),
        attempts,
    })
}

async fn click_pager<B: BrowserDriver>(
    browser: &mut B,
    settings: &HarvestSettings,
    target: PageTarget,
) -> BrowserResult<u32> {
    let next = Locator::css(NEXT_PAGE_SELECTOR);
    browser
        .wait_for(&next, WaitCondition::Clickable, settings.selector_timeout)
        .await?;

    if let PageTarget::Exact(page) = target {
        browser
            .set_attribute(&next, "data-page", &page.to_string())
            .await?;
        tokio::time::sleep(settings.script_settle).await;
    }

    let leads_to = pager_page(browser, &next).await?;

    if let PageTarget::Next { current } = target {
        if leads_to <= current {
            return Err(BrowserError::Navigation {
                url: next.to_string(),
                reason: format!("pager leads to page {} from page {}", leads_to, current),
            });
        }
    }

    tracing::info!("Going to page {}", leads_to);
    browser.click(&next).await?;
    tokio::time::sleep(settings.click_settle).await;

    match target {
        PageTarget::Next { .. } => Ok(leads_to),
        PageTarget::Exact(page) => {
            let landed = pager_page(browser, &next).await?.saturating_sub(1).max(1);
            if landed != page {
                tracing::warn!("Requested page {}, the listing shows page {}", page, landed);
            }
            Ok(landed)
        }
    }
}

/// The page the pager's "next" control currently leads to
async fn pager_page<B: BrowserDriver>(browser: &mut B, next: &Locator) -> BrowserResult<u32> {
    browser
        .get_attribute(next, "data-page")
        .await?
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|page| *page > 0)
        .ok_or_else(|| BrowserError::ElementNotFound(format!("{}[data-page]", next)))
}
