//! The document-query capability and helpers over parsed snapshots.
//!
//! The live rendered page is owned by the host (a browser, a webdriver, a
//! recorded fixture); this crate sees it only through [`PageDriver`]. Each
//! retrieval step pulls a fresh snapshot via [`PageDriver::document`],
//! parses it with `scraper`, and queries it with CSS selectors. Interaction
//! (scrolling, clicking) goes back through the driver so progressive
//! disclosure happens on the real page, not the snapshot.

use scraper::{ElementRef, Html, Selector};

/// Host-supplied capability over the live rendered page.
///
/// Implementations must keep calls synchronous: one retrieval step runs to
/// completion against one snapshot before the orchestrator yields.
pub trait PageDriver {
    /// Current rendered document as HTML.
    fn document(&self) -> String;

    /// Viewport height in pixels.
    fn viewport_height(&self) -> f64;

    /// Total scrollable content height in pixels.
    fn content_height(&self) -> f64;

    /// Current vertical scroll position in pixels.
    fn scroll_top(&self) -> f64;

    /// Scroll down by `pixels`.
    fn scroll_by(&mut self, pixels: f64);

    /// Click the `index`th element matching `selector` on the live page.
    /// Returns false when no such element exists anymore.
    fn click(&mut self, selector: &str, index: usize) -> bool;
}

/// Compile a selector known to be valid at authoring time.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Parse a document snapshot.
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The nearest ancestor that is an element, if any.
pub fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_text_normalizes_whitespace() {
        let html = parse_document("<div><span>hello</span>  <span>world\n</span></div>");
        let div = html.select(&selector("div")).next().unwrap();
        assert_eq!(element_text(&div), "hello world");
    }

    #[test]
    fn test_parent_element() {
        let html = parse_document("<a href=\"/jdoe\"><time datetime=\"t\">x</time></a>");
        let time = html.select(&selector("time")).next().unwrap();
        let parent = parent_element(&time).unwrap();
        assert_eq!(parent.value().name(), "a");
        assert_eq!(parent.value().attr("href"), Some("/jdoe"));
    }
}
