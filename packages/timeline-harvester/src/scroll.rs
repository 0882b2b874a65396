//! Scroll controllers driving progressive content disclosure.
//!
//! The step controller is driven explicitly by the retrieval state machine,
//! one scroll per state step, and distinguishes a natural end (position
//! stops moving) from hitting its step cap. The interval controller scrolls
//! on its own fixed cadence and is useful when no state machine is in the
//! loop.

use std::time::Duration;

use crate::dom::PageDriver;

/// Position change below this, on more than [`STALL_STEPS`] consecutive
/// steps, counts as reaching the end.
const STALL_THRESHOLD_PX: f64 = 10.0;
const STALL_STEPS: u32 = 3;

/// Controller lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStatus {
    Ready,
    Running,
    Stopped,
    /// Hit the configured step cap without a stall
    ExceededLimit,
    /// Reached the end of the content
    Finished,
}

impl ScrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollStatus::Ready => "ready",
            ScrollStatus::Running => "running",
            ScrollStatus::Stopped => "stopped",
            ScrollStatus::ExceededLimit => "exceededlimit",
            ScrollStatus::Finished => "finished",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScrollStatus::Stopped | ScrollStatus::ExceededLimit | ScrollStatus::Finished
        )
    }
}

impl std::fmt::Display for ScrollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scrolls once per explicit `step()` call.
///
/// `Finished` means the page stopped moving (the end was reached);
/// `ExceededLimit` means the step cap was hit first; callers that care
/// whether a pass covered everything must distinguish the two.
#[derive(Debug)]
pub struct StepScroller {
    height_multiplier: f64,
    step_cap: u32,
    steps: u32,
    last_scroll_top: f64,
    status: ScrollStatus,
}

impl StepScroller {
    pub fn new(height_multiplier: f64, step_cap: u32) -> Self {
        Self {
            height_multiplier,
            step_cap,
            steps: 0,
            last_scroll_top: 0.0,
            status: ScrollStatus::Ready,
        }
    }

    pub fn status(&self) -> ScrollStatus {
        self.status
    }

    pub fn stop(&mut self) {
        self.status = ScrollStatus::Stopped;
    }

    pub fn reset(&mut self) {
        self.steps = 0;
        self.last_scroll_top = 0.0;
        self.status = ScrollStatus::Ready;
    }

    /// Scroll once and re-evaluate. No-op once terminal.
    pub fn step(&mut self, driver: &mut dyn PageDriver) {
        if self.status.is_terminal() {
            tracing::trace!(status = %self.status, "step scroller already terminal");
            return;
        }

        self.status = ScrollStatus::Running;
        self.steps += 1;

        let distance = self.height_multiplier * driver.viewport_height();
        driver.scroll_by(distance);

        let position = driver.scroll_top();
        let moved = (position - self.last_scroll_top).abs();
        self.last_scroll_top = position;

        if self.steps > STALL_STEPS && moved < STALL_THRESHOLD_PX {
            tracing::debug!(steps = self.steps, position, "scroll position stalled");
            self.status = ScrollStatus::Finished;
            return;
        }

        if self.steps >= self.step_cap {
            tracing::debug!(steps = self.steps, "scroll step cap reached");
            self.status = ScrollStatus::ExceededLimit;
        }
    }
}

/// Scrolls unconditionally on a fixed cadence until its count runs out or
/// the bottom of the content is reached.
#[derive(Debug)]
pub struct IntervalScroller {
    height_multiplier: f64,
    max_scrolls: u32,
    delay: Duration,
    status: ScrollStatus,
}

impl IntervalScroller {
    pub fn new(height_multiplier: f64, max_scrolls: u32, delay: Duration) -> Self {
        Self {
            height_multiplier,
            max_scrolls,
            delay,
            status: ScrollStatus::Ready,
        }
    }

    pub fn status(&self) -> ScrollStatus {
        self.status
    }

    /// Drive the scroll loop to completion.
    pub async fn run(&mut self, driver: &mut dyn PageDriver) {
        let mut count = 0;

        loop {
            self.status = ScrollStatus::Running;

            driver.scroll_by(self.height_multiplier * driver.viewport_height());
            count += 1;

            let bottom = driver.viewport_height() + driver.scroll_top();
            if count >= self.max_scrolls || bottom >= driver.content_height() {
                self.status = ScrollStatus::Finished;
                return;
            }

            tokio::time::sleep(self.delay).await;
        }
    }
}
