//! Document-side extraction: ordered fallback resolution over the rendered
//! page structure.

pub mod document;
pub mod resolver;
pub mod strategies;

pub use document::DocumentExtractor;
pub use resolver::{resolve, Resolution, Strategy};
