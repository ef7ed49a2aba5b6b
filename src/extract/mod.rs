//! Content extraction for the exhibitor listing
//!
//! This module turns rendered markup into record fields:
//! - `Document`: generic DOM queries and tag stripping over `scraper`
//! - `listing`: the cards of one listing page
//! - `detail`: the fields of one exhibitor detail page

mod content;
pub mod detail;
pub mod listing;

pub use content::{extract_content, Document, ExtractedContent};
pub use detail::{parse_detail, DetailFields};
pub use listing::{parse_listing, ListingItem};

use crate::browser::BrowserError;
use thiserror::Error;

/// Failures of a single extraction attempt
///
/// The display text of each variant is what ends up in a record's `error`
/// column.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("URL attribute not found")]
    MissingUrl,

    #[error("Invalid detail URL {href}: {reason}")]
    InvalidUrl { href: String, reason: String },

    #[error("Company detail not found")]
    MissingDetail,

    #[error("Section content not found")]
    MissingSection,

    #[error("{0}")]
    Browser(#[from] BrowserError),
}

/// CSS selectors the listing page must show before its markup is read
pub const LISTING_READY_SELECTORS: [&str; 2] = [".exc-item.clearfix", ".exc-item-title.inner"];

/// CSS selector the detail page must show before its markup is read
pub const DETAIL_READY_SELECTOR: &str = ".company-detail";

/// CSS selector of the pager's "next" control
pub const NEXT_PAGE_SELECTOR: &str = ".layui-laypage-next";
