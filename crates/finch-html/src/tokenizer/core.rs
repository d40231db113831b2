use super::error::TokenizeError;
use super::grammar;
use super::token::Token;

/// Pull-based tokenizer over an in-memory source.
///
/// The only state between calls is the cursor. Each call to
/// [`next_token`](Self::next_token) matches the grammar at the cursor, moves
/// the cursor past the match and returns the token.
#[derive(Debug, Clone)]
pub struct HTMLTokenizer {
    input: String,
    current_pos: usize,
    /// Set once an error has been yielded through the `Iterator` impl.
    failed: bool,
}

impl HTMLTokenizer {
    /// Create a tokenizer positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: String) -> Self {
        Self {
            input,
            current_pos: 0,
            failed: false,
        }
    }

    /// Byte offset of the cursor.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.current_pos
    }

    /// The input that has not been consumed yet.
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.input[self.current_pos..]
    }

    /// Whether the whole input has been consumed.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.current_pos >= self.input.len()
    }

    /// Produce the next token, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizeError::NoMatch`] when no alternative of the grammar
    /// matches at the cursor. The cursor does not move, so calling again
    /// returns the same error.
    pub fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        let Some((token, consumed)) = grammar::match_token(self.remaining()) else {
            return Err(TokenizeError::NoMatch {
                position: self.current_pos,
                remaining: self.remaining().to_string(),
            });
        };
        self.current_pos += consumed;
        log::trace!(target: "finch_html::tokenizer", "emit token: {token}");
        Ok(Some(token))
    }
}

impl Iterator for HTMLTokenizer {
    type Item = Result<Token, TokenizeError>;

    /// Yields tokens until the input is exhausted. After an error has been
    /// yielded the iterator is finished.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.next_token().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}

impl std::iter::FusedIterator for HTMLTokenizer {}

/// Tokenize a whole document.
///
/// # Errors
///
/// Returns the first [`TokenizeError`]; no tokens are returned in that case.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizeError> {
    HTMLTokenizer::new(input.to_string()).collect()
}
