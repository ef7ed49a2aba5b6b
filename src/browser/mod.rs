//! Browser automation
//!
//! The harvest engine drives pages through the [`BrowserDriver`] trait:
//! one primary tab holds the listing, and a transient tab is opened for
//! each detail page. Tabs are addressed by [`TabHandle`] rather than by
//! position, so closing one never shifts another.

mod chrome;

pub use chrome::ChromeDriver;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stable identifier of an open tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabHandle(pub u64);

impl fmt::Display for TabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// CSS selector addressing an element of the active tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator(String);

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a selector wait requires of the element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Attached to the DOM
    Present,
    /// Attached, rendered and not disabled
    Clickable,
}

/// Browser-level failures
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {seconds}s waiting for {selector}")]
    Timeout { selector: String, seconds: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Unknown tab: {0}")]
    UnknownTab(TabHandle),

    #[error("The primary tab cannot be closed")]
    PrimaryTab,

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

/// Result type alias for browser operations
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Capability set of a browser session
///
/// Element operations apply to the active tab. Every operation may fail;
/// callers decide whether a failure is retryable.
#[allow(async_fn_in_trait)]
pub trait BrowserDriver {
    /// Handle of the tab the session started with
    fn primary_tab(&self) -> TabHandle;

    /// Loads `url` in the active tab, then waits `settle`
    async fn navigate(&mut self, url: &str, settle: Duration) -> BrowserResult<()>;

    /// Opens a new tab at `url` without activating it
    async fn open_tab(&mut self, url: &str) -> BrowserResult<TabHandle>;

    /// Makes `tab` the active tab
    async fn switch_tab(&mut self, tab: TabHandle) -> BrowserResult<()>;

    /// Closes `tab`; the primary tab becomes active if `tab` was active
    async fn close_tab(&mut self, tab: TabHandle) -> BrowserResult<()>;

    /// Waits until `locator` satisfies `condition`, failing after `timeout`
    async fn wait_for(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> BrowserResult<()>;

    /// Clicks the first element matching `locator`
    async fn click(&mut self, locator: &Locator) -> BrowserResult<()>;

    /// Sets an attribute on the first element matching `locator`
    async fn set_attribute(&mut self, locator: &Locator, name: &str, value: &str)
        -> BrowserResult<()>;

    /// Reads an attribute of the first element matching `locator`
    async fn get_attribute(&mut self, locator: &Locator, name: &str)
        -> BrowserResult<Option<String>>;

    /// Current markup of the active tab
    async fn markup(&mut self) -> BrowserResult<String>;

    /// Removes every `script` element from the active tab
    async fn strip_scripts(&mut self) -> BrowserResult<()>;

    /// Ends the session
    async fn quit(self) -> BrowserResult<()>
    where
        Self: Sized;
}
