//! Extraction and retrieval engine for schema-shifting social timelines.
//!
//! Two hostile sources feed one canonical record set: a live,
//! progressively-rendered document whose structure changes by page type and
//! over time, and batches of intercepted network payloads whose shape is
//! undocumented and varies by endpoint and API version. Neither source gets
//! a schema; both get ordered fallback strategies, shape classification,
//! and always-defaulted records, so a markup or API shift degrades single
//! fields instead of whole runs.
//!
//! # Modules
//!
//! - [`records`] - canonical posts, authors, and the dedup-by-id collection
//! - [`mapping`] - descriptor-driven field import/export
//! - [`link`] - classification of URL-like strings into link kinds
//! - [`phrase`] - numeric tokenization of free-text count labels
//! - [`extract`] - fallback-chain extraction from rendered post elements
//! - [`payload`] - shape dispatch and decoding of intercepted JSON
//! - [`dom`] - the host-supplied page capability and snapshot helpers
//! - [`scroll`] - step and interval scroll controllers
//! - [`run`] - the retrieval state machine and tick orchestrator
//! - [`interchange`] - assembly of the flat-record output sequence
//! - [`testing`] - mock page driver and fixtures
//!
//! # Usage
//!
//! ```rust,ignore
//! use timeline_harvester::{HarvestConfig, PageType, Runner};
//!
//! let config = HarvestConfig::new(PageType::ReplyPage, url)
//!     .with_scroll_step_cap(40);
//! let runner = Runner::new(config)?;
//! runner.run(&mut driver, |records| deliver(records)).await;
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod interchange;
pub mod link;
pub mod mapping;
pub mod payload;
pub mod phrase;
pub mod records;
pub mod run;
pub mod scroll;
pub mod testing;

// Re-export the core types at the crate root
pub use config::{DebugVerbosity, HarvestConfig, PageType};
pub use dom::PageDriver;
pub use error::{HarvestError, Result};
pub use extract::{DocumentExtractor, Resolution};
pub use interchange::{harvest_payloads, RunMetadata};
pub use link::{PostLink, StatusKind};
pub use mapping::StringMap;
pub use payload::{parse_batch, DecodedBatch, Instruction, SectionTag, Shape};
pub use phrase::NumericPhrase;
pub use records::{AddOutcome, Author, Post, PostCollection, PostQuality};
pub use run::{Runner, StateStatus, TickOutcome};
pub use scroll::{IntervalScroller, ScrollStatus, StepScroller};
pub use testing::MockPage;
