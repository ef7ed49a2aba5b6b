use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Exhibitor-Harvest
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub browser: BrowserSettings,
    pub run: RunConfig,
    pub output: OutputConfig,
    pub translate: TranslateConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root, detail-page addresses are resolved against it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the exhibitor listing, relative to `base-url`
    #[serde(rename = "listing-path")]
    pub listing_path: String,
}

impl SiteConfig {
    pub fn base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }

    /// Absolute address of the first listing page
    pub fn listing_url(&self) -> Result<Url, url::ParseError> {
        self.base()?.join(&self.listing_path)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.cmef.com.cn/".to_string(),
            listing_path: "exhibitorlist?type=1".to_string(),
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chrome without a window
    pub headless: bool,

    /// Chrome binary to launch instead of the auto-detected one
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,

    /// Extra command-line switches passed to Chrome
    pub args: Vec<String>,

    /// Delay after every navigation (seconds)
    #[serde(rename = "settle-seconds")]
    pub settle_seconds: u64,

    /// Delay after clicking a pager control (milliseconds)
    #[serde(rename = "click-settle-ms")]
    pub click_settle_ms: u64,

    /// Delay after script-injected mutations (milliseconds)
    #[serde(rename = "script-settle-ms")]
    pub script_settle_ms: u64,

    /// Upper bound of every selector wait (seconds)
    #[serde(rename = "selector-timeout-seconds")]
    pub selector_timeout_seconds: u64,
}

impl BrowserSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_seconds)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn script_settle(&self) -> Duration {
        Duration::from_millis(self.script_settle_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_seconds)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            args: Vec::new(),
            settle_seconds: 5,
            click_settle_ms: 1000,
            script_settle_ms: 1000,
            selector_timeout_seconds: 10,
        }
    }
}

/// Traversal and retry policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// First listing page to process
    #[serde(rename = "start-page")]
    pub start_page: u32,

    /// Last listing page to process (inclusive)
    #[serde(rename = "end-page")]
    pub end_page: u32,

    /// Extraction attempts per record
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Failed attempts tolerated across the run before it stops
    #[serde(rename = "error-budget")]
    pub error_budget: u32,

    /// Attempts at advancing to the next listing page
    #[serde(rename = "navigation-retries")]
    pub navigation_retries: u32,

    /// Pause between navigation attempts (seconds)
    #[serde(rename = "navigation-backoff-seconds")]
    pub navigation_backoff_seconds: u64,
}

impl RunConfig {
    pub fn navigation_backoff(&self) -> Duration {
        Duration::from_secs(self.navigation_backoff_seconds)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            end_page: 737,
            max_attempts: 3,
            error_budget: 5,
            navigation_retries: 3,
            navigation_backoff_seconds: 5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the workbook file; snapshots are written next to it
    #[serde(rename = "workbook-path")]
    pub workbook_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            workbook_path: PathBuf::from("exhibitorlist.db"),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Endpoint of the translation REST API
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Source language code
    pub source: String,

    /// Target language code
    pub target: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            api_url: "https://translation.googleapis.com/language/translate/v2".to_string(),
            api_key_env: "GOOGLE_TRANSLATE_API_KEY".to_string(),
            source: "zh-CN".to_string(),
            target: "es".to_string(),
        }
    }
}
