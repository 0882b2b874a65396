//! The tick-driven retrieval orchestrator.
//!
//! One periodic tick runs exactly one state step to completion; between
//! ticks nothing executes. Dispatch is keyed on the active state's
//! name/status compound: an unchanged state runs another step, `finished`
//! swaps in the next state of the page type's fixed sequence (constructed
//! fresh), and `failure` (or any compound with no mapping) aborts the
//! whole run with the failure surfaced in the metadata record. A global
//! tick cap backstops every per-state budget.

use crate::config::{HarvestConfig, PageType};
use crate::error::Result;
use crate::extract::DocumentExtractor;
use crate::interchange::{assemble_run, RunMetadata};
use crate::mapping::StringMap;
use crate::records::{PostCollection, PostQuality};
use crate::run::state::{RetrievalState, StateContext, StateStatus};
use crate::run::states::{
    CheckLoggedIn, ClickExpandReplies, ExpandStrategy, FindPosts, WaitForContent,
};
use crate::scroll::{ScrollStatus, StepScroller};

/// Hard cap on total ticks, independent of any single state's budget.
const MAX_TICKS: u32 = 1000;

/// What the orchestrator wants after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking
    Continue,
    /// The run is over; collect the output
    Done,
}

/// Blueprint for one position in a page type's state sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateSpec {
    CheckLoggedIn,
    WaitForContent,
    FindPosts(PostQuality),
    ClickExpand(ExpandStrategy),
}

impl StateSpec {
    fn build(&self) -> Box<dyn RetrievalState> {
        match self {
            StateSpec::CheckLoggedIn => Box::new(CheckLoggedIn::new()),
            StateSpec::WaitForContent => Box::new(WaitForContent::new()),
            StateSpec::FindPosts(quality) => Box::new(FindPosts::new(*quality)),
            StateSpec::ClickExpand(strategy) => Box::new(ClickExpandReplies::new(*strategy)),
        }
    }
}

fn sequence_for(page_type: PageType) -> Vec<StateSpec> {
    match page_type {
        PageType::Timeline => vec![
            StateSpec::CheckLoggedIn,
            StateSpec::WaitForContent,
            StateSpec::FindPosts(PostQuality::High),
        ],
        PageType::ReplyPage => vec![
            StateSpec::CheckLoggedIn,
            StateSpec::WaitForContent,
            StateSpec::FindPosts(PostQuality::High),
            StateSpec::ClickExpand(ExpandStrategy::Primary),
            StateSpec::FindPosts(PostQuality::Low),
            StateSpec::ClickExpand(ExpandStrategy::Alternate),
            StateSpec::FindPosts(PostQuality::Abusive),
        ],
    }
}

/// Drives one retrieval run over a host-supplied page.
pub struct Runner {
    config: HarvestConfig,
    collection: PostCollection,
    scroller: StepScroller,
    extractor: DocumentExtractor,
    sequence: Vec<StateSpec>,
    index: usize,
    state: Option<Box<dyn RetrievalState>>,
    ticks: u32,
    metadata: RunMetadata,
    done: bool,
}

impl Runner {
    pub fn new(config: HarvestConfig) -> Result<Self> {
        config.validate()?;

        let sequence = sequence_for(config.page_type);
        let state = sequence[0].build();
        let scroller = StepScroller::new(config.scroll_height_multiplier, config.scroll_step_cap);
        let metadata = RunMetadata::new(config.url.clone());

        Ok(Self {
            config,
            collection: PostCollection::new(),
            scroller,
            extractor: DocumentExtractor::new(),
            sequence,
            index: 0,
            state: Some(state),
            ticks: 0,
            metadata,
            done: false,
        })
    }

    pub fn collection(&self) -> &PostCollection {
        &self.collection
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Run one tick: exactly one state step, or one transition.
    pub fn tick(&mut self, driver: &mut dyn crate::dom::PageDriver) -> TickOutcome {
        if self.done {
            self.metadata.fail(
                "runner_called_after_finished",
                "tick invoked after the run already finished",
            );
            return TickOutcome::Done;
        }

        self.ticks += 1;
        self.metadata.ticks = self.ticks;

        if self.ticks > MAX_TICKS {
            self.metadata.fail(
                "runner_too_many_iterations",
                "retrieval exceeded the global tick cap",
            );
            return self.finish_tick();
        }

        let Some(state) = self.state.as_mut() else {
            self.metadata.fail(
                "runner_called_after_finished",
                "tick invoked with no active state",
            );
            return self.finish_tick();
        };

        let status = state.status();
        let compound = format!("{}.{}", state.name(), status);
        self.metadata.last_compound = compound.clone();
        tracing::debug!(%compound, tick = self.ticks, "dispatching");

        match status {
            StateStatus::Ready | StateStatus::Running | StateStatus::ClickedButton => {
                let mut cx = StateContext {
                    driver,
                    scroller: &mut self.scroller,
                    collection: &mut self.collection,
                    extractor: &self.extractor,
                    config: &self.config,
                    tick: self.ticks,
                };
                state.run(&mut cx);
                TickOutcome::Continue
            }

            StateStatus::Finished => self.on_state_finished(),

            StateStatus::Failure => {
                let failure = state.failure().unwrap_or_else(|| {
                    crate::run::state::StateFailure {
                        code: format!("{}_unknown", state.name()),
                        message: format!("unknown failure in {}", state.name()),
                    }
                });
                self.metadata.fail(failure.code, failure.message);
                self.finish_tick()
            }

            StateStatus::NotFound => self.on_state_not_found(),

            StateStatus::Stopped => self.abort_bad_compound(&compound),
        }
    }

    fn current_spec(&self) -> StateSpec {
        self.sequence[self.index]
    }

    fn on_state_finished(&mut self) -> TickOutcome {
        match self.current_spec() {
            StateSpec::FindPosts(_) => {
                // a pass that hit the step cap did not cover everything
                self.metadata.completed = self.scroller.status() == ScrollStatus::Finished;
            }
            StateSpec::ClickExpand(_) => {
                self.metadata.completed = true;
            }
            StateSpec::CheckLoggedIn | StateSpec::WaitForContent => {}
        }

        self.advance_to(self.index + 1)
    }

    fn on_state_not_found(&mut self) -> TickOutcome {
        match self.current_spec() {
            StateSpec::WaitForContent => {
                self.metadata.completed = false;
                self.metadata.content_note = "not found".to_string();
                self.finish_tick()
            }
            // the primary expand strategy missing is not fatal: skip its
            // find pass and try the alternate strategy
            StateSpec::ClickExpand(ExpandStrategy::Primary) => {
                let alternate = self
                    .sequence
                    .iter()
                    .position(|spec| *spec == StateSpec::ClickExpand(ExpandStrategy::Alternate));
                match alternate {
                    Some(index) => self.advance_to(index),
                    None => self.abort_bad_compound("ClickExpandReplies.notfound"),
                }
            }
            StateSpec::ClickExpand(ExpandStrategy::Alternate) => {
                self.metadata.expand_note = "not found".to_string();
                self.finish_tick()
            }
            _ => {
                let compound = self.metadata.last_compound.clone();
                self.abort_bad_compound(&compound)
            }
        }
    }

    fn advance_to(&mut self, index: usize) -> TickOutcome {
        if index >= self.sequence.len() {
            return self.finish_tick();
        }

        self.index = index;
        self.scroller.reset();
        let next = self.sequence[index].build();
        tracing::debug!(state = %next.name(), "entering state");
        self.state = Some(next);
        TickOutcome::Continue
    }

    fn abort_bad_compound(&mut self, compound: &str) -> TickOutcome {
        self.metadata.fail(
            "runner_bad_compound",
            format!("no dispatch mapping for compound: {compound}"),
        );
        self.finish_tick()
    }

    fn finish_tick(&mut self) -> TickOutcome {
        if let Some(state) = &self.state {
            self.metadata.last_compound = format!("{}.{}", state.name(), state.status());
        }
        // discarding the state reference is the only teardown
        self.state = None;
        self.done = true;
        TickOutcome::Done
    }

    /// Consume the runner and assemble the output sequence.
    pub fn finish(mut self) -> Vec<StringMap> {
        self.metadata.finish_timing();
        assemble_run(&self.collection, &[], &[], &self.metadata)
    }

    /// Drive ticks on the configured period until the run completes, then
    /// deliver the full output sequence through `on_complete` exactly once.
    pub async fn run(
        mut self,
        driver: &mut dyn crate::dom::PageDriver,
        on_complete: impl FnOnce(Vec<StringMap>),
    ) {
        let period = self.config.tick_period();

        while self.tick(driver) == TickOutcome::Continue {
            tokio::time::sleep(period).await;
        }

        on_complete(self.finish());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::{MAP_TYPE_KEY, MAP_TYPE_METADATA};
    use crate::testing::MockPage;

    fn timeline_config() -> HarvestConfig {
        HarvestConfig::new(PageType::Timeline, "https://social.example/jdoe")
            .with_login_check_budget(1)
            .with_content_wait_budget(3)
    }

    const TIMELINE: &str = r#"
        <html><body>
          <article>
            <a href="/jdoe/status/11"><time datetime="2023-03-01T00:00:00Z">x</time></a>
            <div lang="en"><span>a post</span></div>
          </article>
        </body></html>
    "#;

    fn drive(runner: &mut Runner, page: &mut MockPage, cap: u32) -> u32 {
        let mut ticks = 0;
        while ticks < cap {
            ticks += 1;
            if runner.tick(page) == TickOutcome::Done {
                return ticks;
            }
        }
        panic!("runner did not finish within {cap} ticks");
    }

    #[test]
    fn test_timeline_run_completes() {
        let mut page = MockPage::new(TIMELINE).with_scroll_positions([0.0, 0.0, 0.0, 0.0]);
        let mut runner = Runner::new(timeline_config()).unwrap();

        drive(&mut runner, &mut page, 50);

        assert!(runner.metadata().completed);
        assert_eq!(runner.metadata().error_code, "");
        assert_eq!(runner.collection().len(), 1);
        assert_eq!(
            runner.metadata().last_compound,
            "FindPosts(high_quality).finished"
        );

        let records = runner.finish();
        let metadata = records.last().unwrap();
        assert_eq!(metadata.get(MAP_TYPE_KEY).unwrap(), MAP_TYPE_METADATA);
        assert_eq!(metadata.get("completed").unwrap(), "true");
    }

    #[test]
    fn test_login_failure_aborts_run() {
        let mut page =
            MockPage::new(r#"<html><body><a id="signin-link">Sign in</a></body></html>"#);
        let mut runner = Runner::new(timeline_config()).unwrap();

        drive(&mut runner, &mut page, 10);

        assert!(!runner.metadata().completed);
        assert_eq!(
            runner.metadata().error_code,
            "check_logged_in_found_login_link"
        );
    }

    #[test]
    fn test_content_never_appears_is_noted_not_errored() {
        let mut page = MockPage::new("<html><body><div>blank</div></body></html>");
        let mut runner = Runner::new(timeline_config()).unwrap();

        drive(&mut runner, &mut page, 20);

        assert!(!runner.metadata().completed);
        assert_eq!(runner.metadata().error_code, "");
        assert_eq!(runner.metadata().content_note, "not found");
    }

    #[test]
    fn test_tick_cap_safety_valve() {
        // a page whose scroll position keeps moving never stalls, and a
        // huge step cap keeps the find pass running forever
        let positions: Vec<f64> = (1..=2000).map(|i| i as f64 * 100.0).collect();
        let mut page = MockPage::new(TIMELINE).with_scroll_positions(positions);
        let config = timeline_config().with_scroll_step_cap(100_000);
        let mut runner = Runner::new(config).unwrap();

        let ticks = drive(&mut runner, &mut page, 1500);
        assert_eq!(ticks, 1001);
        assert!(!runner.metadata().completed);
        assert_eq!(runner.metadata().error_code, "runner_too_many_iterations");
    }

    #[test]
    fn test_reentrancy_guard() {
        let mut page = MockPage::new("<html><body><div>blank</div></body></html>");
        let mut runner = Runner::new(timeline_config()).unwrap();
        drive(&mut runner, &mut page, 20);

        assert_eq!(runner.tick(&mut page), TickOutcome::Done);
        assert_eq!(
            runner.metadata().error_code,
            "runner_called_after_finished"
        );
    }

    #[test]
    fn test_step_cap_marks_run_incomplete() {
        let positions: Vec<f64> = (1..=50).map(|i| i as f64 * 100.0).collect();
        let mut page = MockPage::new(TIMELINE).with_scroll_positions(positions);
        let config = timeline_config().with_scroll_step_cap(2);
        let mut runner = Runner::new(config).unwrap();

        drive(&mut runner, &mut page, 50);

        // the pass ended by cap, not by reaching the end
        assert!(!runner.metadata().completed);
        assert_eq!(runner.metadata().error_code, "");
    }

    #[tokio::test]
    async fn test_async_run_delivers_callback_once() {
        let mut page = MockPage::new(TIMELINE).with_scroll_positions([0.0, 0.0, 0.0, 0.0]);
        let config = timeline_config().with_tick_period_ms(1);
        let runner = Runner::new(config).unwrap();

        let mut delivered = 0;
        runner
            .run(&mut page, |records| {
                delivered += 1;
                assert!(records.len() >= 3);
            })
            .await;

        assert_eq!(delivered, 1);
    }
}
