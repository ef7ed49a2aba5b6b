//! Listing page parsing
//!
//! A listing page renders its exhibitor cards as `div.company-item` inside
//! the `div.exl-r` column. Each card's first `div` carries the relative
//! detail-page address in `data-href`.

use super::content::{element_text, find_in, Document};

/// One exhibitor card of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Zero-based position on the page
    pub index: usize,
    /// Card title, used for progress messages only
    pub title: Option<String>,
    /// Raw `data-href` value, relative to the site root
    pub detail_href: Option<String>,
}

/// Parses the cards of a listing page
///
/// Returns an empty list when the card column or the cards are missing.
pub fn parse_listing(markup: &str) -> Vec<ListingItem> {
    let mut document = Document::parse(markup);
    document.strip_tags(&["head"]);

    let Some(column) = document.find_one("div", &["exl-r"], None) else {
        tracing::debug!("Listing column not found");
        return Vec::new();
    };

    let items = document
        .find_all("div", &["company-item"], Some(column))
        .into_iter()
        .enumerate()
        .map(|(index, card)| ListingItem {
            index,
            title: find_in(card, "div", &["exc-item-title"]).and_then(element_text),
            detail_href: find_in(card, "div", &[])
                .and_then(|first| first.value().attr("data-href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string),
        })
        .collect();

    items
}
