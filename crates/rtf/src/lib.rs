pub mod attr;
pub mod charset;
pub mod counters;
pub mod document;
pub mod error;
pub mod perf_fixtures;
pub mod scope;
pub mod tables;
pub mod token;

mod parser;
mod tokenizer;

pub use crate::attr::{AttrKey, AttrPool, AttrSet, AttrState, AttrValue};
pub use crate::charset::TextEncoding;
pub use crate::counters::ParseStats;
pub use crate::document::{DocumentSink, EditPosition, ResolvedRun, TextDocument};
pub use crate::error::{ParseError, ParseErrorCode};
pub use crate::parser::{ParserConfig, ParserState, RtfParser};
pub use crate::scope::{MAX_CHILDREN, ScopeFrame, ScopeStack};
pub use crate::tables::{
    ColorRecord, ColorTable, FontFamily, FontPitch, FontRecord, FontTable, StyleRecord,
    StyleTable,
};
pub use crate::token::{ControlWord, RawText, TextPiece, Token, TokenGroup};
pub use crate::tokenizer::{
    RtfTokenizer, TokenizeResult, TokenizerConfig, TokenizerStats, tokenize,
};

/// Parses a complete document into a fresh `TextDocument`.
pub fn parse_document(input: &[u8]) -> RtfParser<TextDocument> {
    let mut parser = RtfParser::new(TextDocument::new(), ParserConfig::default());
    parser.parse(input);
    parser
}
