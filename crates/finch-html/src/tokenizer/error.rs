use thiserror::Error;

/// Failure to segment the input into tokens.
///
/// The grammar has no recovery rules for malformed markup declarations or
/// tags, so any of these ends tokenization for good.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// No token alternative matches at the cursor.
    #[error("no token matches at byte {position}: {remaining:?}")]
    NoMatch {
        /// Byte offset of the cursor in the input.
        position: usize,
        /// The unconsumed input starting at the cursor.
        remaining: String,
    },
}

impl TokenizeError {
    /// Byte offset at which tokenization stopped.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::NoMatch { position, .. } => *position,
        }
    }
}
