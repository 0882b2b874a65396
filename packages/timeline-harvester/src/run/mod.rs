//! The retrieval state machine and its tick-driven orchestrator.

pub mod runner;
pub mod state;
pub mod states;

pub use runner::{Runner, TickOutcome};
pub use state::{RetrievalState, StateContext, StateFailure, StateStatus};
pub use states::{CheckLoggedIn, ClickExpandReplies, ExpandStrategy, FindPosts, WaitForContent};
