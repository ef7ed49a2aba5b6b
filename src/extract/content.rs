//! DOM queries and content extraction
//!
//! A thin layer over `scraper` offering the handful of operations the
//! page parsers need. None of the queries fail: an unknown selector or a
//! missing node simply yields nothing.

use scraper::{ElementRef, Html, Selector};

/// Text, media and links found under one element
///
/// Every field is a labeled, newline-joined block. `images`, `videos` and
/// `links` are empty strings when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub images: String,
    pub videos: String,
    pub links: String,
}

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a complete HTML document
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Re-parses the subtree of `node` as a document of its own
    pub fn isolate(node: ElementRef<'_>) -> Self {
        Self::parse(&node.html())
    }

    /// Removes every element with one of the given tag names
    ///
    /// Detached nodes stay in the arena, so document-wide queries start from
    /// the root element to only see what is still attached.
    pub fn strip_tags(&mut self, tags: &[&str]) {
        for tag in tags {
            let Some(selector) = build_selector(tag, &[]) else {
                continue;
            };

            let ids: Vec<_> = self
                .html
                .root_element()
                .select(&selector)
                .map(|el| el.id())
                .collect();
            for id in ids {
                if let Some(mut node) = self.html.tree.get_mut(id) {
                    node.detach();
                }
            }
        }
    }

    /// Finds the first `tag` element carrying all `classes`
    ///
    /// Searches below `scope` when given, otherwise the whole document.
    pub fn find_one<'a>(
        &'a self,
        tag: &str,
        classes: &[&str],
        scope: Option<ElementRef<'a>>,
    ) -> Option<ElementRef<'a>> {
        self.find_all(tag, classes, scope).into_iter().next()
    }

    /// Finds every `tag` element carrying all `classes`
    pub fn find_all<'a>(
        &'a self,
        tag: &str,
        classes: &[&str],
        scope: Option<ElementRef<'a>>,
    ) -> Vec<ElementRef<'a>> {
        let Some(selector) = build_selector(tag, classes) else {
            return Vec::new();
        };

        let found = match scope {
            Some(scope) => scope.select(&selector).collect(),
            None => self.html.root_element().select(&selector).collect(),
        };
        found
    }
}

/// Finds the first descendant of `scope` matching `tag` and `classes`
pub fn find_in<'a>(scope: ElementRef<'a>, tag: &str, classes: &[&str]) -> Option<ElementRef<'a>> {
    let selector = build_selector(tag, classes)?;
    let found = scope.select(&selector).next();
    found
}

/// Whitespace-collapsed text of an element, `None` when blank
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Builds the text, image, video and link blocks of `node`
///
/// # Example
///
/// ```
/// use exhibitor_harvest::extract::{extract_content, Document};
///
/// let document = Document::parse(r#"<div class="c">Hello <a href="/x">there</a></div>"#);
/// let node = document.find_one("div", &["c"], None).unwrap();
/// let content = extract_content(node);
/// assert_eq!(content.text, "TEXT\nHello there");
/// assert_eq!(content.links, "LINKS\nLink: /x");
/// assert_eq!(content.images, "");
/// ```
pub fn extract_content(node: ElementRef<'_>) -> ExtractedContent {
    let text = collapse_whitespace(node);
    let text = if text.is_empty() {
        "TEXT".to_string()
    } else {
        format!("TEXT\n{}", text)
    };

    ExtractedContent {
        text,
        images: attribute_block(node, "img", "src", "IMAGES", "Image"),
        videos: attribute_block(node, "video", "src", "VIDEOS", "Video"),
        links: attribute_block(node, "a", "href", "LINKS", "Link"),
    }
}

fn collapse_whitespace(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute_block(
    node: ElementRef<'_>,
    tag: &str,
    attribute: &str,
    heading: &str,
    label: &str,
) -> String {
    let Ok(selector) = Selector::parse(&format!("{}[{}]", tag, attribute)) else {
        return String::new();
    };

    let lines: Vec<String> = node
        .select(&selector)
        .filter_map(|el| el.value().attr(attribute))
        .map(|value| format!("{}: {}", label, value))
        .collect();

    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n{}", heading, lines.join("\n"))
    }
}

fn build_selector(tag: &str, classes: &[&str]) -> Option<Selector> {
    let mut query = tag.to_string();
    for class in classes {
        query.push('.');
        query.push_str(class);
    }
    Selector::parse(&query).ok()
}
