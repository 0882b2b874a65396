//! Canonical normalized records: posts, authors, and the deduplicating
//! collection they live in for the duration of one retrieval run.

mod author;
mod collection;
mod post;

pub use author::Author;
pub use collection::{AddOutcome, PostCollection};
pub use post::Post;

use serde::{Deserialize, Serialize};

/// Provenance tag recording which retrieval pass / page section a post was
/// extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostQuality {
    High,
    Low,
    Abusive,
    Unknown,
}

impl PostQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostQuality::High => "high_quality",
            PostQuality::Low => "low_quality",
            PostQuality::Abusive => "abusive_quality",
            PostQuality::Unknown => "unknown_quality",
        }
    }
}

impl std::fmt::Display for PostQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The merge rule's notion of "unfilled": empty string or the `"0"` default.
pub fn is_empty_or_zero(value: &str) -> bool {
    value.is_empty() || value == "0"
}

/// Terse one-line rendition of a text field for debug summaries.
pub(crate) fn simplify_text(text: &str, max_len: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .trim()
        .chars()
        .take(max_len)
        .collect();

    if cleaned.is_empty() {
        "[EMPTY]".to_string()
    } else {
        cleaned
    }
}
