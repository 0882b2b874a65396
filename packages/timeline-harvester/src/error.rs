//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Note that most
//! failure modes in this crate are deliberately *not* errors: field-level
//! misses are recorded on the record, unrecognized payload shapes are
//! dropped with a diagnostic, and run-level failures travel as structured
//! data in the metadata record. The types here cover the constructor and
//! validation seams only.

use thiserror::Error;

/// Errors that can occur while configuring or starting a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A configuration value failed validation
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The target URL could not be parsed
    #[error("invalid target url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvestError>;
