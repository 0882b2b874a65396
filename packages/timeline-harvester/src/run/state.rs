//! State abstractions for the retrieval orchestrator.

use crate::config::HarvestConfig;
use crate::dom::PageDriver;
use crate::extract::DocumentExtractor;
use crate::records::PostCollection;
use crate::scroll::StepScroller;

/// Lifecycle status of one retrieval state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStatus {
    Ready,
    Running,
    Stopped,
    Failure,
    Finished,
    /// An expand button was clicked; the page is settling
    ClickedButton,
    /// The state's target never appeared within its budget
    NotFound,
}

impl StateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateStatus::Ready => "ready",
            StateStatus::Running => "running",
            StateStatus::Stopped => "stopped",
            StateStatus::Failure => "failure",
            StateStatus::Finished => "finished",
            StateStatus::ClickedButton => "clickedbutton",
            StateStatus::NotFound => "notfound",
        }
    }
}

impl std::fmt::Display for StateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure code and message a state surfaces into run metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFailure {
    pub code: String,
    pub message: String,
}

/// Shared resources one state step runs against. Exactly one state is
/// active at a time, so the mutable borrows here never overlap.
pub struct StateContext<'a> {
    pub driver: &'a mut dyn PageDriver,
    pub scroller: &'a mut StepScroller,
    pub collection: &'a mut PostCollection,
    pub extractor: &'a DocumentExtractor,
    pub config: &'a HarvestConfig,
    /// Orchestrator tick number, stamped onto extracted posts as the pass
    /// number.
    pub tick: u32,
}

/// One independently instantiable retrieval state.
pub trait RetrievalState {
    /// Display name; the orchestrator's dispatch key is `name.status`.
    fn name(&self) -> String;

    fn status(&self) -> StateStatus;

    /// One run-to-completion step.
    fn run(&mut self, cx: &mut StateContext<'_>);

    /// Failure details once `status() == Failure`.
    fn failure(&self) -> Option<StateFailure> {
        None
    }
}
