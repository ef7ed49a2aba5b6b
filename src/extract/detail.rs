//! Detail page parsing
//!
//! Only the outer `div.company-detail` container and its `div.section` are
//! required. Every other field falls back to `None`, which the engine
//! records as the sentinel.

use super::content::{element_text, extract_content, find_in, Document, ExtractedContent};
use super::ExtractionError;

/// Fields read from an exhibitor's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub content: Option<ExtractedContent>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

/// Parses the markup of a detail page
pub fn parse_detail(markup: &str) -> Result<DetailFields, ExtractionError> {
    let mut document = Document::parse(markup);
    document.strip_tags(&["head", "script"]);

    let detail = document
        .find_one("div", &["company-detail"], None)
        .ok_or(ExtractionError::MissingDetail)?;
    let detail = Document::isolate(detail);

    let section = detail
        .find_one("div", &["section"], None)
        .ok_or(ExtractionError::MissingSection)?;

    let mut fields = DetailFields {
        content: find_in(section, "div", &["comp-detail"]).map(extract_content),
        ..DetailFields::default()
    };

    if let Some(header) = detail.find_one("div", &["company-header"], None) {
        if let Some(title) = find_in(header, "div", &["title-container"]) {
            fields.company = find_in(title, "h2", &[]).and_then(element_text);
            fields.address = find_in(title, "p", &["address"])
                .and_then(|p| find_in(p, "span", &[]))
                .and_then(element_text);
            fields.website = find_in(title, "p", &["website"])
                .and_then(|p| find_in(p, "a", &[]))
                .and_then(element_text);
        }

        fields.logo = find_in(header, "img", &[])
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(str::to_string);
    }

    Ok(fields)
}
