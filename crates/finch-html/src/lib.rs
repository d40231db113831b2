//! Error-tolerant HTML tokenizer and tree builder.
//!
//! # Scope
//!
//! This crate implements:
//! - **HTML Tokenizer**: an ordered alternation of anchored patterns
//!   - Whitespace, text, comment, CDATA, DOCTYPE and tag tokens
//!   - Attribute parsing with quoted, unquoted and bare values
//!
//! - **HTML Parser / Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Insertion modes: Initial, BeforeHtml, BeforeHead, InHead, AfterHead, InBody,
//!     InTable, InTableBody, InRow, InCell
//!   - Implicit `html`, `head`, `body`, `tbody` and `tr` elements
//!   - A reduced adoption agency algorithm for mis-nested formatting elements
//!
//! # Not Yet Implemented
//!
//! - Character reference decoding
//! - RCDATA, RAWTEXT and script data states
//! - Foster parenting
//! - Namespaces and foreign content

/// HTML parser and tree construction.
pub mod parser;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

pub use finch_dom::DomTree;
pub use parser::{ActiveFormattingElement, HTMLParser, InsertionMode, ParseIssue};
pub use tokenizer::{Attribute, HTMLTokenizer, Token, TokenizeError, tokenize};

/// Parse `input` into a tree.
///
/// # Errors
///
/// Returns a [`TokenizeError`] when some position of the input matches no
/// token pattern. No partial tree is returned.
pub fn parse_document(input: &str) -> Result<DomTree, TokenizeError> {
    HTMLParser::new(input.to_string()).run()
}

/// Parse `input` into a tree and collect the issues met along the way.
///
/// # Errors
///
/// Returns a [`TokenizeError`] when the input cannot be tokenized.
pub fn parse_document_with_issues(
    input: &str,
) -> Result<(DomTree, Vec<ParseIssue>), TokenizeError> {
    HTMLParser::new(input.to_string()).run_with_issues()
}
