//! Terminal parse errors.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    /// Input ended with groups still open.
    UnterminatedGroup,
    /// Unexpected token inside a color, font or style table entry.
    MalformedTableEntry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    /// Absolute index of the offending token.
    pub position: usize,
}

impl ParseError {
    pub fn new(code: ParseErrorCode, position: usize) -> Self {
        Self { code, position }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.code {
            ParseErrorCode::UnterminatedGroup => "unterminated group",
            ParseErrorCode::MalformedTableEntry => "malformed table entry",
        };
        write!(f, "{what} at token {}", self.position)
    }
}

impl std::error::Error for ParseError {}
