//! Testing utilities including mock implementations.
//!
//! [`MockPage`] stands in for the host's live page: it serves scripted
//! document snapshots, simulates scroll physics (including forced stalls),
//! and journals clicks so tests can assert on interaction without a
//! browser.

use std::collections::VecDeque;

use crate::dom::PageDriver;

/// A scripted page driver for tests.
///
/// By default scrolling advances by the requested distance and stalls at
/// the bottom of the content; [`MockPage::with_scroll_positions`] overrides
/// that with an explicit sequence of post-scroll positions. Clicks are
/// journaled, and each click can swap in the next queued document to mimic
/// click-to-expand disclosure.
pub struct MockPage {
    html: String,
    viewport_height: f64,
    content_height: f64,
    scroll_top: f64,
    scripted: bool,
    scroll_positions: VecDeque<f64>,
    click_documents: VecDeque<String>,
    clicks: Vec<(String, usize)>,
}

impl MockPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            viewport_height: 800.0,
            content_height: 2400.0,
            scroll_top: 0.0,
            scripted: false,
            scroll_positions: VecDeque::new(),
            click_documents: VecDeque::new(),
            clicks: Vec::new(),
        }
    }

    pub fn with_viewport_height(mut self, height: f64) -> Self {
        self.viewport_height = height;
        self
    }

    pub fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = height;
        self
    }

    /// Script the post-scroll position of each successive `scroll_by` call.
    /// Once the script runs out the position stops moving (a stall).
    pub fn with_scroll_positions(mut self, positions: impl IntoIterator<Item = f64>) -> Self {
        self.scripted = true;
        self.scroll_positions = positions.into_iter().collect();
        self
    }

    /// Queue a document to swap in after the next click.
    pub fn with_document_after_click(mut self, html: impl Into<String>) -> Self {
        self.click_documents.push_back(html.into());
        self
    }

    /// Replace the current document.
    pub fn set_document(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    /// Every `(selector, index)` click performed so far.
    pub fn clicks(&self) -> &[(String, usize)] {
        &self.clicks
    }
}

impl PageDriver for MockPage {
    fn document(&self) -> String {
        self.html.clone()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn content_height(&self) -> f64 {
        self.content_height
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_by(&mut self, pixels: f64) {
        if let Some(next) = self.scroll_positions.pop_front() {
            self.scroll_top = next;
        } else if !self.scripted {
            self.scroll_top = (self.scroll_top + pixels)
                .min((self.content_height - self.viewport_height).max(0.0));
        }
        // an exhausted script stalls in place
    }

    fn click(&mut self, selector: &str, index: usize) -> bool {
        self.clicks.push((selector.to_string(), index));
        if let Some(html) = self.click_documents.pop_front() {
            self.html = html;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scroll_physics_stall_at_bottom() {
        let mut page = MockPage::new("<html></html>");
        page.scroll_by(800.0);
        assert_eq!(page.scroll_top(), 800.0);
        page.scroll_by(800.0);
        assert_eq!(page.scroll_top(), 1600.0);
        page.scroll_by(800.0);
        // content 2400, viewport 800: cannot scroll past 1600
        assert_eq!(page.scroll_top(), 1600.0);
    }

    #[test]
    fn test_scripted_positions_then_stall() {
        let mut page = MockPage::new("").with_scroll_positions([100.0, 250.0]);
        page.scroll_by(800.0);
        assert_eq!(page.scroll_top(), 100.0);
        page.scroll_by(800.0);
        assert_eq!(page.scroll_top(), 250.0);
        page.scroll_by(800.0);
        assert_eq!(page.scroll_top(), 250.0);
    }

    #[test]
    fn test_click_journal_and_document_swap() {
        let mut page = MockPage::new("before").with_document_after_click("after");
        assert!(page.click("div[role=\"button\"]", 2));
        assert_eq!(page.clicks(), &[("div[role=\"button\"]".to_string(), 2)]);
        assert_eq!(page.document(), "after");
    }
}
