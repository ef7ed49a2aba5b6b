//! Chrome session over the DevTools protocol

use super::{BrowserDriver, BrowserError, BrowserResult, Locator, TabHandle, WaitCondition};
use crate::config::BrowserSettings;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Interval between selector polls
const POLL_INTERVAL: Duration = Duration::from_millis(250);

impl From<CdpError> for BrowserError {
    fn from(err: CdpError) -> Self {
        BrowserError::Protocol(err.to_string())
    }
}

/// Open tabs by handle, with the primary and the active one tracked
///
/// A tab stays registered until [`TabSet::release`], so a tab whose close
/// failed can still be closed on shutdown.
struct TabSet<P> {
    pages: HashMap<TabHandle, P>,
    primary: TabHandle,
    active: TabHandle,
    next_id: u64,
}

impl<P> TabSet<P> {
    fn new(primary_page: P) -> Self {
        let primary = TabHandle(0);
        let mut pages = HashMap::new();
        pages.insert(primary, primary_page);
        Self {
            pages,
            primary,
            active: primary,
            next_id: 1,
        }
    }

    fn insert(&mut self, page: P) -> TabHandle {
        let handle = TabHandle(self.next_id);
        self.next_id += 1;
        self.pages.insert(handle, page);
        handle
    }

    fn get(&self, tab: TabHandle) -> BrowserResult<&P> {
        self.pages.get(&tab).ok_or(BrowserError::UnknownTab(tab))
    }

    fn active(&self) -> BrowserResult<&P> {
        self.get(self.active)
    }

    /// The page behind `tab`, refusing the primary tab
    fn closable(&self, tab: TabHandle) -> BrowserResult<&P> {
        if tab == self.primary {
            return Err(BrowserError::PrimaryTab);
        }
        self.get(tab)
    }

    /// Forgets a closed tab; the primary tab becomes active if it was
    fn release(&mut self, tab: TabHandle) {
        self.pages.remove(&tab);
        if self.active == tab {
            self.active = self.primary;
        }
    }

    fn drain(&mut self) -> Vec<P> {
        self.pages.drain().map(|(_, page)| page).collect()
    }
}

/// A launched Chrome instance and its open tabs
pub struct ChromeDriver {
    browser: Browser,
    handler: JoinHandle<()>,
    tabs: TabSet<Page>,
}

impl ChromeDriver {
    /// Launches Chrome and opens the primary tab on a blank page
    pub async fn launch(settings: &BrowserSettings) -> BrowserResult<Self> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .args(settings.args.clone())
            .build()
            .map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The protocol handler must be polled for any page command to complete
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        tracing::info!("Browser launched (headless: {})", settings.headless);

        Ok(Self {
            browser,
            handler,
            tabs: TabSet::new(page),
        })
    }

    fn active_page(&self) -> BrowserResult<&Page> {
        self.tabs.active()
    }

    async fn evaluate_bool(&self, expression: String) -> BrowserResult<bool> {
        let result = self.active_page()?.evaluate(expression).await?;
        result
            .into_value::<bool>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}

/// Quotes `value` as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn wait_expression(selector: &str, condition: WaitCondition) -> String {
    let selector = js_string(selector);
    match condition {
        WaitCondition::Present => format!("document.querySelector({}) !== null", selector),
        WaitCondition::Clickable => format!(
            "(() => {{ const el = document.querySelector({}); \
             return el !== null && !el.disabled && el.getClientRects().length > 0; }})()",
            selector
        ),
    }
}

impl BrowserDriver for ChromeDriver {
    fn primary_tab(&self) -> TabHandle {
        self.tabs.primary
    }

    async fn navigate(&mut self, url: &str, settle: Duration) -> BrowserResult<()> {
        tracing::debug!("Navigating {} to {}", self.tabs.active, url);
        self.active_page()?
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        tokio::time::sleep(settle).await;
        Ok(())
    }

    async fn open_tab(&mut self, url: &str) -> BrowserResult<TabHandle> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let handle = self.tabs.insert(page);
        tracing::debug!("Opened {} at {}", handle, url);
        Ok(handle)
    }

    async fn switch_tab(&mut self, tab: TabHandle) -> BrowserResult<()> {
        self.tabs.get(tab)?.bring_to_front().await?;
        self.tabs.active = tab;
        Ok(())
    }

    async fn close_tab(&mut self, tab: TabHandle) -> BrowserResult<()> {
        self.tabs.closable(tab)?.clone().close().await?;
        self.tabs.release(tab);
        tracing::debug!("Closed {}", tab);
        Ok(())
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> BrowserResult<()> {
        let expression = wait_expression(locator.selector(), condition);
        let started = Instant::now();

        loop {
            // Evaluation errors while the page is still loading count as "not yet"
            if let Ok(true) = self.evaluate_bool(expression.clone()).await {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout {
                    selector: locator.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, locator: &Locator) -> BrowserResult<()> {
        let element = self
            .active_page()?
            .find_element(locator.selector())
            .await
            .map_err(|_| BrowserError::ElementNotFound(locator.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn set_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
        value: &str,
    ) -> BrowserResult<()> {
        let expression = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (el === null) return false; el.setAttribute({}, {}); return true; }})()",
            js_string(locator.selector()),
            js_string(name),
            js_string(value)
        );

        if self.evaluate_bool(expression).await? {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(locator.to_string()))
        }
    }

    async fn get_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let element = self
            .active_page()?
            .find_element(locator.selector())
            .await
            .map_err(|_| BrowserError::ElementNotFound(locator.to_string()))?;
        Ok(element.attribute(name).await?)
    }

    async fn markup(&mut self) -> BrowserResult<String> {
        Ok(self.active_page()?.content().await?)
    }

    async fn strip_scripts(&mut self) -> BrowserResult<()> {
        self.active_page()?
            .evaluate("document.querySelectorAll('script').forEach(s => s.remove())")
            .await?;
        Ok(())
    }

    async fn quit(mut self) -> BrowserResult<()> {
        for page in self.tabs.drain() {
            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close tab on shutdown: {}", e);
            }
        }
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        tracing::info!("Browser closed");
        Ok(())
    }
}
