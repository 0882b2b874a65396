//! The concrete retrieval states.

use scraper::ElementRef;

use crate::dom::{element_text, parse_document, parent_element, selector};
use crate::records::{Post, PostQuality};
use crate::run::state::{RetrievalState, StateContext, StateFailure, StateStatus};
use crate::scroll::ScrollStatus;

/// Confirms the session is logged in before anything else runs.
///
/// The budget is an iteration count: the probe only runs once the attempt
/// counter exceeds it, giving a slow page that many ticks to settle first.
pub struct CheckLoggedIn {
    attempts: u32,
    status: StateStatus,
    failure: Option<StateFailure>,
}

impl CheckLoggedIn {
    pub fn new() -> Self {
        Self {
            attempts: 0,
            status: StateStatus::Ready,
            failure: None,
        }
    }
}

impl Default for CheckLoggedIn {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalState for CheckLoggedIn {
    fn name(&self) -> String {
        "CheckLoggedIn".to_string()
    }

    fn status(&self) -> StateStatus {
        self.status
    }

    fn failure(&self) -> Option<StateFailure> {
        self.failure.clone()
    }

    fn run(&mut self, cx: &mut StateContext<'_>) {
        if matches!(self.status, StateStatus::Finished | StateStatus::Failure) {
            return;
        }

        self.status = StateStatus::Running;
        self.attempts += 1;

        if self.attempts <= cx.config.login_check_budget {
            return;
        }

        let document = parse_document(&cx.driver.document());
        let probe = selector(&cx.config.login_probe_selector);

        if document.select(&probe).next().is_some() {
            tracing::warn!("login probe matched; session is logged out");
            self.failure = Some(StateFailure {
                code: "check_logged_in_found_login_link".to_string(),
                message: "found a login link; the session is not logged in".to_string(),
            });
            self.status = StateStatus::Failure;
        } else {
            self.status = StateStatus::Finished;
        }
    }
}

/// Waits for the first content item to render.
pub struct WaitForContent {
    iterations: u32,
    status: StateStatus,
}

impl WaitForContent {
    pub fn new() -> Self {
        Self {
            iterations: 0,
            status: StateStatus::Ready,
        }
    }
}

impl Default for WaitForContent {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalState for WaitForContent {
    fn name(&self) -> String {
        "WaitForContent".to_string()
    }

    fn status(&self) -> StateStatus {
        self.status
    }

    fn run(&mut self, cx: &mut StateContext<'_>) {
        if matches!(
            self.status,
            StateStatus::Finished | StateStatus::NotFound | StateStatus::Failure
        ) {
            return;
        }

        self.status = StateStatus::Running;
        self.iterations += 1;

        let document = parse_document(&cx.driver.document());
        let items = selector(&cx.config.item_selector);

        if document.select(&items).next().is_some() {
            self.status = StateStatus::Finished;
            return;
        }

        tracing::debug!(iteration = self.iterations, "content selector not yet present");
        if self.iterations > cx.config.content_wait_budget {
            self.status = StateStatus::NotFound;
        }
    }
}

/// Extracts every rendered content item, stamps provenance, and steps the
/// scroller; finishes when the scroller terminates.
pub struct FindPosts {
    quality: PostQuality,
    status: StateStatus,
}

impl FindPosts {
    pub fn new(quality: PostQuality) -> Self {
        Self {
            quality,
            status: StateStatus::Ready,
        }
    }

    pub fn quality(&self) -> PostQuality {
        self.quality
    }

    /// Link consecutively extracted items: each post's previous/next id is
    /// its neighbor within this pass, `"0"` at the boundaries.
    fn assign_previous_next(posts: &mut [Post]) {
        let ids: Vec<String> = posts.iter().map(|post| post.id().to_string()).collect();
        let len = posts.len();

        for (index, post) in posts.iter_mut().enumerate() {
            post.set("previous_post_id", "0");
            post.set("next_post_id", "0");

            if index > 0 {
                post.set("previous_post_id", ids[index - 1].clone());
            }
            if index + 1 < len {
                post.set("next_post_id", ids[index + 1].clone());
            }
        }
    }
}

impl RetrievalState for FindPosts {
    fn name(&self) -> String {
        format!("FindPosts({})", self.quality)
    }

    fn status(&self) -> StateStatus {
        self.status
    }

    fn run(&mut self, cx: &mut StateContext<'_>) {
        if matches!(self.status, StateStatus::Finished | StateStatus::Failure) {
            return;
        }

        self.status = StateStatus::Running;

        let document = parse_document(&cx.driver.document());
        let items = selector(&cx.config.item_selector);

        let mut posts: Vec<Post> = Vec::new();
        for (index, element) in document.select(&items).enumerate() {
            let mut post = cx.extractor.extract(&element);
            post.set("quality", self.quality.as_str());
            post.set("pass_number", cx.tick.to_string());
            post.set("pass_index", index.to_string());
            posts.push(post);
        }

        Self::assign_previous_next(&mut posts);

        let extracted = posts.len();
        let kept = cx.collection.add_all(posts);
        tracing::debug!(
            quality = %self.quality,
            extracted,
            kept,
            collection = cx.collection.len(),
            "find pass complete"
        );

        if cx.config.debug.is_verbose() {
            tracing::debug!("collection:\n{}", cx.collection.debug_summary());
        }

        cx.scroller.step(cx.driver);
        if matches!(
            cx.scroller.status(),
            ScrollStatus::Finished | ScrollStatus::ExceededLimit
        ) {
            self.status = StateStatus::Finished;
        }
    }
}

/// Which structural query locates the expand-replies button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandStrategy {
    /// Section-level button with a labeled span
    Primary,
    /// Item-level button whose container pairs a longer message with it
    Alternate,
}

impl ExpandStrategy {
    fn css(&self) -> &'static str {
        match self {
            ExpandStrategy::Primary => "section div[role=\"button\"]",
            ExpandStrategy::Alternate => "article div[role=\"button\"]",
        }
    }
}

/// Clicks the control that reveals hidden replies, then lets the page
/// settle for a budgeted number of ticks.
pub struct ClickExpandReplies {
    strategy: ExpandStrategy,
    attempts: u32,
    status: StateStatus,
}

impl ClickExpandReplies {
    pub fn new(strategy: ExpandStrategy) -> Self {
        Self {
            strategy,
            attempts: 0,
            status: StateStatus::Ready,
        }
    }

    fn button_label(button: &ElementRef<'_>) -> Option<String> {
        button
            .select(&selector("span"))
            .map(|span| element_text(&span))
            .find(|text| !text.is_empty())
    }

    /// Index of the matching button among this strategy's selector matches.
    fn find_button(&self, document: &scraper::Html) -> Option<usize> {
        let candidates = selector(self.strategy.css());

        for (index, button) in document.select(&candidates).enumerate() {
            let Some(label) = Self::button_label(&button) else {
                continue;
            };

            match self.strategy {
                ExpandStrategy::Primary => return Some(index),
                ExpandStrategy::Alternate => {
                    // the real expand control sits next to an explanatory
                    // message longer than its own label
                    let container = parent_element(&button)
                        .and_then(|parent| parent_element(&parent));
                    let Some(container) = container else {
                        continue;
                    };
                    let has_message = container
                        .select(&selector("span"))
                        .map(|span| element_text(&span))
                        .any(|text| text.len() > label.len());
                    if has_message {
                        return Some(index);
                    }
                }
            }
        }

        None
    }
}

impl RetrievalState for ClickExpandReplies {
    fn name(&self) -> String {
        match self.strategy {
            ExpandStrategy::Primary => "ClickExpandReplies".to_string(),
            ExpandStrategy::Alternate => "ClickExpandRepliesAlt".to_string(),
        }
    }

    fn status(&self) -> StateStatus {
        self.status
    }

    fn run(&mut self, cx: &mut StateContext<'_>) {
        if matches!(
            self.status,
            StateStatus::Finished | StateStatus::NotFound | StateStatus::Failure
        ) {
            return;
        }

        self.attempts += 1;

        if self.status == StateStatus::ClickedButton {
            if self.attempts > cx.config.expand_settle_budget {
                self.status = StateStatus::Finished;
            }
            return;
        }

        self.status = StateStatus::Running;

        let document = parse_document(&cx.driver.document());
        if let Some(index) = self.find_button(&document) {
            tracing::info!(strategy = ?self.strategy, index, "clicking expand-replies control");
            if cx.driver.click(self.strategy.css(), index) {
                self.status = StateStatus::ClickedButton;
                self.attempts = 0;
                return;
            }
        }

        if self.attempts > cx.config.expand_attempt_budget {
            self.status = StateStatus::NotFound;
            return;
        }

        cx.scroller.step(cx.driver);
    }
}
