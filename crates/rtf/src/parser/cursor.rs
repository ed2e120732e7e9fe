//! Buffered token cursor with absolute indices.
//!
//! Parsing steps read tokens through the cursor and may step back over what
//! they read. Tokens before the last checkpoint (minus a small lookback
//! window) are released.

use std::collections::VecDeque;

use crate::error::ParseError;
use crate::token::Token;

/// Tokens kept behind a checkpoint for `lookback`.
const LOOKBACK: usize = 3;

/// Why a parsing step stopped before completing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// The buffered tokens ran out before the stream was finished.
    NeedMoreInput,
    EndOfInput,
    Failed(ParseError),
}

#[derive(Debug, Default)]
pub(crate) struct TokenCursor {
    tokens: VecDeque<Token>,
    /// Absolute index of `tokens[0]`.
    base: usize,
    /// Absolute index of the next token to read.
    position: usize,
    finished: bool,
}

impl TokenCursor {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn extend(&mut self, tokens: Vec<Token>) {
        self.tokens.extend(tokens);
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Absolute index of the token returned by the last `next`.
    pub(crate) fn current_index(&self) -> usize {
        self.position.saturating_sub(1)
    }

    pub(crate) fn next(&mut self) -> Result<Token, Interrupt> {
        match self.tokens.get(self.position - self.base) {
            Some(token) => {
                self.position += 1;
                Ok(token.clone())
            }
            None if self.finished => Err(Interrupt::EndOfInput),
            None => Err(Interrupt::NeedMoreInput),
        }
    }

    pub(crate) fn back(&mut self, count: usize) {
        self.position = self.position.saturating_sub(count).max(self.base);
    }

    pub(crate) fn seek(&mut self, position: usize) {
        assert!(
            position >= self.base && position <= self.base + self.tokens.len(),
            "seek to released or unread token {position} (buffered {}..{})",
            self.base,
            self.base + self.tokens.len()
        );
        self.position = position;
    }

    /// `lookback(0)` is the token last returned by `next`, `lookback(1)` the
    /// one before it.
    pub(crate) fn lookback(&self, distance: usize) -> Option<&Token> {
        let index = self.position.checked_sub(1 + distance)?;
        let offset = index.checked_sub(self.base)?;
        self.tokens.get(offset)
    }

    /// Drops tokens that no rewind to `checkpoint` can reach.
    pub(crate) fn release_before(&mut self, checkpoint: usize) {
        let keep_from = checkpoint.saturating_sub(LOOKBACK).max(self.base);
        let released = (keep_from - self.base).min(self.tokens.len());
        self.tokens.drain(..released);
        self.base += released;
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ControlWord;

    fn cursor_with(tokens: Vec<Token>) -> TokenCursor {
        let mut cursor = TokenCursor::default();
        cursor.extend(tokens);
        cursor
    }

    #[test]
    fn reads_steps_back_and_reports_exhaustion() {
        let mut cursor = cursor_with(vec![Token::GroupOpen, Token::IgnoreFlag, Token::GroupClose]);
        assert_eq!(cursor.next(), Ok(Token::GroupOpen));
        assert_eq!(cursor.next(), Ok(Token::IgnoreFlag));
        assert_eq!(cursor.lookback(1), Some(&Token::GroupOpen));
        assert_eq!(cursor.lookback(2), None);
        cursor.back(1);
        assert_eq!(cursor.next(), Ok(Token::IgnoreFlag));
        assert_eq!(cursor.next(), Ok(Token::GroupClose));
        assert_eq!(cursor.next(), Err(Interrupt::NeedMoreInput));
        cursor.finish();
        assert_eq!(cursor.next(), Err(Interrupt::EndOfInput));
    }

    #[test]
    fn release_keeps_lookback_window() {
        let tokens = (0..10)
            .map(|i| Token::control(ControlWord::F, Some(i)))
            .collect();
        let mut cursor = cursor_with(tokens);
        for _ in 0..8 {
            assert!(cursor.next().is_ok());
        }
        cursor.release_before(8);
        assert_eq!(cursor.buffered(), 5);
        assert_eq!(cursor.lookback(2), Some(&Token::control(ControlWord::F, Some(5))));
        cursor.seek(5);
        assert_eq!(cursor.next(), Ok(Token::control(ControlWord::F, Some(5))));
    }
}
