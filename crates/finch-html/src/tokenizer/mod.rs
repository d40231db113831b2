//! HTML tokenizer module.
//!
//! Segments the source into [`Token`]s with an ordered alternation of anchored
//! patterns, one token per call.

/// Tokenizer failures.
pub mod error;
/// The token grammar.
mod grammar;
/// Token types produced by the tokenizer.
pub mod token;
/// The pull-based tokenizer.
pub mod core;

pub use error::TokenizeError;
pub use token::{Attribute, Token};
pub use self::core::{HTMLTokenizer, tokenize};
