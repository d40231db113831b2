//! Common utilities for the finch parser.
//!
//! This crate provides shared infrastructure used by the parser crates:
//! - **Warning System** - deduplicated diagnostics routed through the `log` facade

pub mod warning;
