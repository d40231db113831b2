//! HTML parser module for tree construction.

/// Reduced adoption agency algorithm.
mod adoption_agency;
/// Tree builder and insertion modes.
pub mod core;
/// Element category tables.
mod tag_sets;

pub use self::core::{ActiveFormattingElement, HTMLParser, InsertionMode, ParseIssue};
