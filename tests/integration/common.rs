//! Scripted browser and fixtures shared by the integration tests

use exhibitor_harvest::browser::{
    BrowserDriver, BrowserError, BrowserResult, Locator, TabHandle, WaitCondition,
};
use exhibitor_harvest::extract::NEXT_PAGE_SELECTOR;
use exhibitor_harvest::harvest::HarvestSettings;
use exhibitor_harvest::storage::{Snapshots, SqliteWorkbook};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

pub const BASE_URL: &str = "https://expo.test/";

/// Settings with no delays
pub fn test_settings() -> HarvestSettings {
    let base_url = Url::parse(BASE_URL).unwrap();
    HarvestSettings {
        listing_url: base_url.join("exhibitorlist?type=1").unwrap(),
        base_url,
        max_attempts: 3,
        error_budget: 5,
        navigation_retries: 3,
        navigation_backoff: Duration::ZERO,
        settle: Duration::ZERO,
        click_settle: Duration::ZERO,
        script_settle: Duration::ZERO,
        selector_timeout: Duration::from_secs(1),
    }
}

/// A workbook in a temporary directory
pub struct TempWorkbook {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempWorkbook {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exhibitorlist.db");
        Self { dir, path }
    }

    pub fn open(&self) -> SqliteWorkbook {
        SqliteWorkbook::open(&self.path).unwrap()
    }

    pub fn snapshots(&self) -> Snapshots {
        Snapshots::for_workbook(&self.path)
    }
}

/// Absolute detail URL for a relative card href
pub fn detail_url(href: &str) -> String {
    Url::parse(BASE_URL).unwrap().join(href).unwrap().to_string()
}

/// Listing page markup with one card per href
pub fn listing_page(hrefs: &[&str]) -> String {
    let cards: Vec<String> = hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            format!(
                r#"<div class="company-item"><div class="exc-item clearfix" data-href="{}">
                     <div class="exc-item-title inner">Exhibitor {}</div>
                   </div></div>"#,
                href,
                i + 1
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Exhibitors</title></head><body>
           <div class="exl-r">{}</div>
           <div class="layui-laypage"><a class="layui-laypage-next" data-page="2">Next</a></div>
           </body></html>"#,
        cards.join("\n")
    )
}

/// Detail page markup; `address: None` leaves the address element out
pub fn detail_page(company: &str, address: Option<&str>) -> String {
    let address = address
        .map(|a| format!(r#"<p class="address"><i></i><span>{}</span></p>"#, a))
        .unwrap_or_default();

    format!(
        r#"<html><head><title>{company}</title></head><body>
           <div class="company-detail">
             <div class="company-header">
               <div class="img"><img src="https://cdn.expo.test/{company}.png"></div>
               <div class="title-container">
                 <h2>{company}</h2>
                 {address}
                 <p class="website"><a href="https://{company}.example">www.{company}.example</a></p>
               </div>
             </div>
             <div class="section">
               <div class="comp-detail">{company} builds medical devices.</div>
             </div>
           </div>
           <script>track()</script>
           </body></html>"#,
        company = company,
        address = address
    )
}

/// In-memory browser driven by scripted pages
///
/// The primary tab shows the listing page `current_page`; every other tab
/// shows the detail markup registered for its URL, or a page without any
/// exhibitor content.
#[derive(Default)]
pub struct FakeBrowser {
    pub listings: HashMap<u32, String>,
    pub details: HashMap<String, String>,
    /// Number of times opening a URL fails before it succeeds
    pub open_failures: HashMap<String, u32>,
    /// Number of pager waits that time out; `u32::MAX` never recovers
    pub pager_failures: u32,
    /// Highest page the pager can reach
    pub last_page: u32,

    pub current_page: u32,
    pub pager_value: Option<String>,
    pub pager_clicks: u32,
    pub opened: Vec<String>,
    pub navigations: Vec<String>,
    pub max_open_tabs: usize,

    tabs: HashMap<TabHandle, String>,
    active: Option<TabHandle>,
    next_id: u64,
}

impl FakeBrowser {
    pub fn new(last_page: u32) -> Self {
        Self {
            last_page,
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn with_listing(mut self, page: u32, hrefs: &[&str]) -> Self {
        self.listings.insert(page, listing_page(hrefs));
        self
    }

    pub fn with_detail(mut self, href: &str, markup: String) -> Self {
        self.details.insert(detail_url(href), markup);
        self
    }

    /// Detail tabs still open
    pub fn open_detail_tabs(&self) -> usize {
        self.tabs.len()
    }

    fn is_pager(locator: &Locator) -> bool {
        locator.selector() == NEXT_PAGE_SELECTOR
    }
}

impl BrowserDriver for FakeBrowser {
    fn primary_tab(&self) -> TabHandle {
        TabHandle(0)
    }

    async fn navigate(&mut self, url: &str, _settle: Duration) -> BrowserResult<()> {
        self.navigations.push(url.to_string());
        self.active = None;
        self.current_page = 1;
        self.pager_value = Some("2".to_string());
        Ok(())
    }

    async fn open_tab(&mut self, url: &str) -> BrowserResult<TabHandle> {
        self.opened.push(url.to_string());

        if let Some(remaining) = self.open_failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_CONNECTION_RESET".to_string(),
                });
            }
        }

        let handle = TabHandle(self.next_id);
        self.next_id += 1;
        self.tabs.insert(handle, url.to_string());
        self.max_open_tabs = self.max_open_tabs.max(self.tabs.len());
        Ok(handle)
    }

    async fn switch_tab(&mut self, tab: TabHandle) -> BrowserResult<()> {
        if tab == self.primary_tab() {
            self.active = None;
            return Ok(());
        }
        if !self.tabs.contains_key(&tab) {
            return Err(BrowserError::UnknownTab(tab));
        }
        self.active = Some(tab);
        Ok(())
    }

    async fn close_tab(&mut self, tab: TabHandle) -> BrowserResult<()> {
        if tab == self.primary_tab() {
            return Err(BrowserError::PrimaryTab);
        }
        self.tabs.remove(&tab).ok_or(BrowserError::UnknownTab(tab))?;
        if self.active == Some(tab) {
            self.active = None;
        }
        Ok(())
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        _condition: WaitCondition,
        timeout: Duration,
    ) -> BrowserResult<()> {
        if Self::is_pager(locator) && self.pager_failures > 0 {
            if self.pager_failures != u32::MAX {
                self.pager_failures -= 1;
            }
            return Err(BrowserError::Timeout {
                selector: locator.to_string(),
                seconds: timeout.as_secs(),
            });
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> BrowserResult<()> {
        if !Self::is_pager(locator) {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        let requested = self
            .pager_value
            .as_deref()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);
        self.current_page = requested.min(self.last_page);
        self.pager_value = Some((self.current_page + 1).to_string());
        self.pager_clicks += 1;
        Ok(())
    }

    async fn set_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
        value: &str,
    ) -> BrowserResult<()> {
        if !Self::is_pager(locator) || name != "data-page" {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        self.pager_value = Some(value.to_string());
        Ok(())
    }

    async fn get_attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        if !Self::is_pager(locator) || name != "data-page" {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        Ok(self.pager_value.clone())
    }

    async fn markup(&mut self) -> BrowserResult<String> {
        let markup = match self.active {
            None => self.listings.get(&self.current_page).cloned(),
            Some(tab) => self
                .tabs
                .get(&tab)
                .and_then(|url| self.details.get(url))
                .cloned(),
        };
        Ok(markup.unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn strip_scripts(&mut self) -> BrowserResult<()> {
        Ok(())
    }

    async fn quit(self) -> BrowserResult<()> {
        Ok(())
    }
}
