//! Run configuration.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{HarvestError, Result};

/// Which page layout the retrieval sequence targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// A timeline of posts: one find pass
    Timeline,
    /// A reply thread: find passes interleaved with click-to-expand
    ReplyPage,
}

/// How chatty diagnostic output should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugVerbosity {
    Off,
    Terse,
    Verbose,
}

impl DebugVerbosity {
    pub fn is_debug(&self) -> bool {
        !matches!(self, DebugVerbosity::Off)
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, DebugVerbosity::Verbose)
    }
}

/// Configuration for one retrieval run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub page_type: PageType,

    /// Target page URL, recorded into run metadata.
    pub url: String,

    /// Gates the verbose record dumps. Default: terse.
    pub debug: DebugVerbosity,

    /// Login-check attempts before the probe runs. This is an iteration
    /// count against the tick counter, not a delay. Default: 5.
    pub login_check_budget: u32,

    /// Ticks to wait for the first content item to render. Default: 20.
    pub content_wait_budget: u32,

    /// Scroll distance as a multiple of the viewport height. Default: 1.0.
    pub scroll_height_multiplier: f64,

    /// Step-scroller cap per retrieval pass. Default: 20.
    pub scroll_step_cap: u32,

    /// Orchestrator tick period in milliseconds. Default: 250.
    pub tick_period_ms: u64,

    /// CSS selector matching one rendered content item. Default: `article`.
    pub item_selector: String,

    /// CSS selector whose presence after the login-check budget means the
    /// session is logged out. Default: `#signin-link`.
    pub login_probe_selector: String,

    /// Attempts to locate an expand-replies button before giving up.
    /// Default: 10.
    pub expand_attempt_budget: u32,

    /// Ticks to let the page settle after clicking expand. Default: 5.
    pub expand_settle_budget: u32,
}

impl HarvestConfig {
    pub fn new(page_type: PageType, url: impl Into<String>) -> Self {
        Self {
            page_type,
            url: url.into(),
            debug: DebugVerbosity::Terse,
            login_check_budget: 5,
            content_wait_budget: 20,
            scroll_height_multiplier: 1.0,
            scroll_step_cap: 20,
            tick_period_ms: 250,
            item_selector: "article".to_string(),
            login_probe_selector: "#signin-link".to_string(),
            expand_attempt_budget: 10,
            expand_settle_budget: 5,
        }
    }

    pub fn with_debug(mut self, debug: DebugVerbosity) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_login_check_budget(mut self, budget: u32) -> Self {
        self.login_check_budget = budget;
        self
    }

    pub fn with_content_wait_budget(mut self, budget: u32) -> Self {
        self.content_wait_budget = budget;
        self
    }

    pub fn with_scroll_height_multiplier(mut self, multiplier: f64) -> Self {
        self.scroll_height_multiplier = multiplier;
        self
    }

    pub fn with_scroll_step_cap(mut self, cap: u32) -> Self {
        self.scroll_step_cap = cap;
        self
    }

    pub fn with_tick_period_ms(mut self, period: u64) -> Self {
        self.tick_period_ms = period;
        self
    }

    pub fn with_item_selector(mut self, selector: impl Into<String>) -> Self {
        self.item_selector = selector.into();
        self
    }

    pub fn with_login_probe_selector(mut self, selector: impl Into<String>) -> Self {
        self.login_probe_selector = selector.into();
        self
    }

    pub fn with_expand_attempt_budget(mut self, budget: u32) -> Self {
        self.expand_attempt_budget = budget;
        self
    }

    pub fn with_expand_settle_budget(mut self, budget: u32) -> Self {
        self.expand_settle_budget = budget;
        self
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Enforce the controllers' preconditions up front so nothing deeper in
    /// the run has to panic.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url).map_err(|source| HarvestError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        if self.scroll_height_multiplier < 0.01 {
            return Err(invalid("scroll_height_multiplier must be at least 0.01"));
        }
        if self.scroll_step_cap < 1 {
            return Err(invalid("scroll_step_cap must be at least 1"));
        }
        if self.tick_period_ms < 1 {
            return Err(invalid("tick_period_ms must be at least 1"));
        }
        if self.content_wait_budget < 1 {
            return Err(invalid("content_wait_budget must be at least 1"));
        }
        if Selector::parse(&self.item_selector).is_err() {
            return Err(invalid("item_selector is not a valid CSS selector"));
        }
        if Selector::parse(&self.login_probe_selector).is_err() {
            return Err(invalid("login_probe_selector is not a valid CSS selector"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> HarvestError {
    HarvestError::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = HarvestConfig::new(PageType::Timeline, "https://social.example/jdoe");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_url_rejected() {
        let config = HarvestConfig::new(PageType::Timeline, "not a url");
        assert!(matches!(
            config.validate(),
            Err(HarvestError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_bad_multiplier_rejected() {
        let config = HarvestConfig::new(PageType::Timeline, "https://social.example/x")
            .with_scroll_height_multiplier(0.0);
        assert!(matches!(
            config.validate(),
            Err(HarvestError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_selector_rejected() {
        let config = HarvestConfig::new(PageType::Timeline, "https://social.example/x")
            .with_item_selector("[[[");
        assert!(config.validate().is_err());
    }
}
