//! Translation pass
//!
//! A second, independent pass over an already scraped workbook. It fills
//! the `translated`, `text_translated` and `company_translated` columns,
//! saving after every row the same way the scraper does.

mod google;
mod pass;

pub use google::{build_http_client, GoogleTranslator};
pub use pass::{translate_workbook, TranslateReport};

use thiserror::Error;

/// Translation failures
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Translation API returned no translation")]
    EmptyResponse,

    #[error("Invalid translation endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type alias for translation operations
pub type TranslateResult<T> = std::result::Result<T, TranslateError>;

/// A text translation service
#[allow(async_fn_in_trait)]
pub trait Translator {
    /// Translates `text` from the configured source to the target language
    async fn translate(&self, text: &str) -> TranslateResult<String>;
}
