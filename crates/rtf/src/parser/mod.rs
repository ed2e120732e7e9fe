//! RTF parser: token dispatch, table readers and the streaming lifecycle.
//!
//! The parser drives a `ScopeStack` from the token stream and writes text
//! into a `DocumentSink`. Parsing runs in replayable steps: a checkpoint is
//! taken after every completed step, and when the buffered tokens run out
//! mid-step the cursor rewinds to it and the parser reports
//! `ParserState::Pending`. Every step's side effects are safe to repeat, so
//! the result does not depend on how the input was chunked.

mod attrs;
mod cursor;
mod readers;


use std::borrow::Cow;

use crate::attr::reader::AttrReader;
use crate::attr::{AttrKey, AttrPool, AttrSet, AttrValue};
use crate::charset::TextEncoding;
use crate::counters::ParseStats;
use crate::document::DocumentSink;
use crate::error::{ParseError, ParseErrorCode};
use crate::scope::{ResolveContext, ScopeStack};
use crate::tables::{ColorTable, FontRecord, FontTable, StyleTable};
use crate::token::{ControlWord, Token, TokenGroup};
use crate::tokenizer::{RtfTokenizer, TokenizerConfig};

use attrs::AttrTarget;
use cursor::{Interrupt, TokenCursor};
use readers::{ColorReader, FontReader, StyleReader};

/// Default tab stop applied when the document never sets `\deftab`.
const DEFAULT_TAB_STOP: i32 = 720;

#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// The target document is fresh: `\deff`, `\deftab` and `\deflang` set
    /// pool defaults.
    pub new_document: bool,
    /// Drop scope attributes that the scope's style already provides.
    pub check_style_attrs: bool,
    /// UI language tag; picks the fallback code page for font names.
    pub ui_language: Option<String>,
    /// Name reported by `font()` for ids missing from the font table.
    pub default_font_name: String,
    pub tokenizer: TokenizerConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            new_document: true,
            check_style_attrs: false,
            ui_language: None,
            default_font_name: "Times New Roman".to_string(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserState {
    NotStarted,
    Working,
    /// Waiting for more input.
    Pending,
    Accepted,
    Error,
}

/// Where a replay from the checkpoint continues.
#[derive(Clone, Debug)]
enum Resume {
    Dispatch,
    ColorTable(ColorReader),
    FontTable(FontReader),
    StyleSheet(StyleReader),
}

#[derive(Clone, Debug)]
struct Checkpoint {
    position: usize,
    resume: Resume,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            position: 0,
            resume: Resume::Dispatch,
        }
    }
}

enum Flow {
    Continue,
    Accepted,
}

pub struct RtfParser<D: DocumentSink> {
    config: ParserConfig,
    tokenizer: RtfTokenizer,
    cursor: TokenCursor,
    doc: D,
    pool: AttrPool,
    defaults: AttrSet,
    defaults_built: bool,
    scope: ScopeStack,
    colors: ColorTable,
    fonts: FontTable,
    styles: StyleTable,
    attr_reader: AttrReader,
    /// Document code page.
    encoding: TextEncoding,
    /// `\deff` seen before the font table.
    pending_default_font: u16,
    default_tab_set: bool,
    check_style_attrs: bool,
    open_groups: usize,
    checkpoint: Checkpoint,
    state: ParserState,
    error: Option<ParseError>,
    stats: ParseStats,
}

impl<D: DocumentSink> RtfParser<D> {
    pub fn new(doc: D, config: ParserConfig) -> Self {
        Self {
            tokenizer: RtfTokenizer::new(config.tokenizer.clone()),
            check_style_attrs: config.check_style_attrs,
            config,
            cursor: TokenCursor::default(),
            doc,
            pool: AttrPool::new(),
            defaults: AttrSet::new(),
            defaults_built: false,
            scope: ScopeStack::new(),
            colors: ColorTable::new(),
            fonts: FontTable::new(),
            styles: StyleTable::new(),
            attr_reader: AttrReader::default(),
            encoding: TextEncoding::default(),
            pending_default_font: 0,
            default_tab_set: false,
            open_groups: 0,
            checkpoint: Checkpoint::default(),
            state: ParserState::NotStarted,
            error: None,
            stats: ParseStats::default(),
        }
    }

    /// Resets tables, scopes and stream state for a new parse. The document
    /// is left as is.
    pub fn start(&mut self) {
        self.tokenizer = RtfTokenizer::new(self.config.tokenizer.clone());
        self.cursor.clear();
        self.pool = AttrPool::new();
        self.defaults.clear();
        self.defaults_built = false;
        self.scope.clear();
        self.colors.clear();
        self.fonts.clear();
        self.styles.clear();
        self.attr_reader.reset();
        self.encoding = TextEncoding::default();
        self.pending_default_font = 0;
        self.default_tab_set = false;
        self.check_style_attrs = self.config.check_style_attrs;
        self.open_groups = 0;
        self.checkpoint = Checkpoint::default();
        self.error = None;
        self.stats = ParseStats::default();
        self.set_state(ParserState::Working);
    }

    /// Feeds a chunk of input and parses as far as it allows. Input after
    /// the document end is ignored.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> ParserState {
        if self.state == ParserState::NotStarted {
            self.start();
        }
        if self.is_done() {
            return self.state;
        }
        self.tokenizer.push_bytes(bytes);
        self.cursor.extend(self.tokenizer.drain_tokens());
        self.resume()
    }

    /// Marks the end of input and runs the parse to completion.
    pub fn finish(&mut self) -> ParserState {
        if self.state == ParserState::NotStarted {
            self.start();
        }
        if self.is_done() {
            return self.state;
        }
        self.tokenizer.finish();
        self.cursor.extend(self.tokenizer.drain_tokens());
        self.cursor.finish();
        self.resume()
    }

    /// Continues from the last checkpoint with whatever input is buffered.
    pub fn resume(&mut self) -> ParserState {
        if matches!(self.state, ParserState::Working | ParserState::Pending) {
            self.run();
        }
        self.state
    }

    /// One-shot parse of a complete input.
    pub fn parse(&mut self, input: &[u8]) -> ParserState {
        self.start();
        self.push_bytes(input);
        self.finish()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn pool(&self) -> &AttrPool {
        &self.pool
    }

    /// Document code page selected by `\ansi`, `\mac`, `\ansicpg` and friends.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Default font id as set in the pool.
    pub fn default_font(&self) -> u16 {
        self.pool
            .default_item(AttrKey::Font)
            .and_then(AttrValue::as_int)
            .and_then(|id| u16::try_from(id).ok())
            .unwrap_or(0)
    }

    /// Font `id`, or a stand-in named after the configured default font.
    pub fn font(&self, id: u16) -> Cow<'_, FontRecord> {
        if let Some(font) = self.fonts.get(id) {
            return Cow::Borrowed(font);
        }
        let family = self
            .fonts
            .get(self.default_font())
            .map(|font| font.family)
            .unwrap_or_default();
        Cow::Owned(FontRecord {
            name: self.config.default_font_name.clone(),
            family,
            ..FontRecord::default()
        })
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    fn is_done(&self) -> bool {
        matches!(self.state, ParserState::Accepted | ParserState::Error)
    }

    fn set_state(&mut self, next: ParserState) {
        if self.state == next {
            return;
        }
        log::debug!(target: "rtf.parser", "state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn run(&mut self) {
        self.set_state(ParserState::Working);
        loop {
            let step = match self.checkpoint.resume.clone() {
                Resume::Dispatch => self.dispatch_next(),
                Resume::ColorTable(reader) => self.read_color_table(reader),
                Resume::FontTable(reader) => self.read_font_table(reader),
                Resume::StyleSheet(reader) => self.read_style_sheet(reader),
            };
            match step {
                Ok(Flow::Continue) => self.save_checkpoint(Resume::Dispatch),
                Ok(Flow::Accepted) => {
                    self.accept();
                    return;
                }
                Err(Interrupt::NeedMoreInput) => {
                    self.cursor.seek(self.checkpoint.position);
                    self.set_state(ParserState::Pending);
                    return;
                }
                Err(Interrupt::EndOfInput) => {
                    if self.open_groups > 0 {
                        let position = self.cursor.position();
                        self.fail(ParseError::new(ParseErrorCode::UnterminatedGroup, position));
                    } else {
                        self.accept();
                    }
                    return;
                }
                Err(Interrupt::Failed(error)) => {
                    self.fail(error);
                    return;
                }
            }
        }
    }

    fn save_checkpoint(&mut self, resume: Resume) {
        let position = self.cursor.position();
        self.checkpoint = Checkpoint { position, resume };
        self.cursor.release_before(position);
        self.stats.tokens = position as u64;
    }

    fn accept(&mut self) {
        self.stats.tokens = self.cursor.position() as u64;
        self.ensure_default_tab();
        self.with_scope(|scope, ctx| scope.flush_all(ctx));
        self.set_state(ParserState::Accepted);
    }

    fn fail(&mut self, error: ParseError) {
        log::warn!(target: "rtf.parser", "parse failed: {error}");
        self.scope.clear();
        self.error = Some(error);
        self.set_state(ParserState::Error);
    }

    fn malformed(&self) -> Interrupt {
        Interrupt::Failed(ParseError::new(
            ParseErrorCode::MalformedTableEntry,
            self.cursor.current_index(),
        ))
    }

    /// Default set copied into every new frame; built once per parse.
    fn ensure_defaults(&mut self) {
        if self.defaults_built {
            return;
        }
        self.defaults_built = true;
        let script_space = AttrValue::Bool(false);
        if self.config.new_document {
            self.pool.set_pool_default(AttrKey::ScriptSpace, script_space);
        } else {
            self.defaults.insert(AttrKey::ScriptSpace, script_space);
        }
    }

    fn ensure_default_tab(&mut self) {
        if !self.default_tab_set {
            self.default_tab_set = true;
            self.pool
                .set_pool_default(AttrKey::DefaultTabStop, AttrValue::Int(DEFAULT_TAB_STOP));
        }
    }

    fn with_scope<R>(
        &mut self,
        f: impl FnOnce(&mut ScopeStack, &mut ResolveContext<'_>) -> R,
    ) -> R {
        self.ensure_defaults();
        let Self {
            scope,
            doc,
            defaults,
            styles,
            pool,
            stats,
            check_style_attrs,
            ..
        } = self;
        let mut ctx = ResolveContext {
            doc,
            defaults,
            styles,
            pool,
            check_style_attrs: *check_style_attrs,
            stats,
        };
        f(scope, &mut ctx)
    }

    fn dispatch_next(&mut self) -> Result<Flow, Interrupt> {
        match self.cursor.next()? {
            Token::GroupOpen => {
                self.open_groups += 1;
                self.with_scope(|scope, ctx| scope.open_group(ctx));
            }
            Token::GroupClose => {
                if self.open_groups == 0 {
                    log::debug!(
                        target: "rtf.parser",
                        "stray group close at token {}",
                        self.cursor.current_index()
                    );
                    return Ok(Flow::Continue);
                }
                self.open_groups -= 1;
                self.with_scope(|scope, ctx| scope.close_group(ctx));
                if self.open_groups == 0 {
                    return Ok(Flow::Accepted);
                }
            }
            Token::Text(raw) => {
                let text = raw.decode(self.body_encoding());
                self.insert_text(&text);
            }
            Token::Control { word, param } => return self.dispatch_word(word, param),
            Token::Unknown { .. } => self.skip_if_ignorable()?,
            Token::IgnoreFlag | Token::Binary(_) => {}
        }
        Ok(Flow::Continue)
    }

    fn dispatch_word(&mut self, word: ControlWord, param: Option<i32>) -> Result<Flow, Interrupt> {
        match word {
            ControlWord::ColorTable => return self.read_color_table(ColorReader::default()),
            ControlWord::FontTable => {
                let reader = FontReader::new(TextEncoding::system_default(
                    self.config.ui_language.as_deref(),
                ));
                return self.read_font_table(reader);
            }
            ControlWord::StyleSheet => {
                let reader = StyleReader::new(self.rtf_defaults());
                self.check_style_attrs = false;
                return self.read_style_sheet(reader);
            }
            ControlWord::Deff => {
                if self.config.new_document {
                    let id = clamp_id(param);
                    if self.fonts.is_empty() {
                        self.pending_default_font = id;
                    } else {
                        self.set_default_font(id);
                    }
                }
            }
            ControlWord::DefTab => {
                if self.config.new_document {
                    self.pool.set_pool_default(
                        AttrKey::DefaultTabStop,
                        AttrValue::Int(param.unwrap_or(DEFAULT_TAB_STOP)),
                    );
                    self.default_tab_set = true;
                }
            }
            ControlWord::DefLang => {
                if self.config.new_document
                    && let Some(lang) = param
                {
                    self.pool.set_pool_default(AttrKey::Language, AttrValue::Int(lang));
                }
            }
            ControlWord::Ansi => self.set_code_page(1252),
            ControlWord::Mac => self.set_code_page(10000),
            ControlWord::Pc => self.set_code_page(437),
            ControlWord::Pca => self.set_code_page(850),
            ControlWord::AnsiCpg => {
                if let Some(code_page) = param {
                    self.set_code_page(code_page);
                }
            }
            ControlWord::Par => self.doc.insert_paragraph(),
            ControlWord::Rtf => {}
            _ => {
                if let Some(ch) = word.single_char() {
                    let mut buf = [0u8; 4];
                    self.insert_text(ch.encode_utf8(&mut buf));
                } else if word.group() == TokenGroup::Destination {
                    self.skip_group()?;
                } else if word.is_writer_extension() {
                    self.read_flagged_attr()?;
                } else if word.group().is_attribute() {
                    self.read_attr(Token::control(word, param), &mut AttrTarget::Current)?;
                } else {
                    self.skip_if_ignorable()?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn set_code_page(&mut self, code_page: i32) {
        match TextEncoding::from_code_page(code_page) {
            Some(encoding) => self.encoding = encoding,
            None => log::debug!(
                target: "rtf.parser",
                "unsupported code page {code_page}; keeping {}",
                self.encoding.name()
            ),
        }
    }

    fn set_default_font(&mut self, id: u16) {
        self.pool.set_pool_default(AttrKey::Font, AttrValue::Int(i32::from(id)));
    }

    fn rtf_defaults(&mut self) -> AttrSet {
        self.ensure_defaults();
        self.defaults.clone()
    }

    /// Charset of the font in effect at the insertion point, else the
    /// document code page.
    fn body_encoding(&self) -> TextEncoding {
        self.scope
            .effective(AttrKey::Font, &self.pool)
            .and_then(AttrValue::as_int)
            .and_then(|id| u16::try_from(id).ok())
            .and_then(|id| self.fonts.get(id))
            .and_then(|font| font.encoding)
            .unwrap_or(self.encoding)
    }

    fn insert_text(&mut self, text: &str) {
        self.doc.insert_text(text);
        self.ensure_default_tab();
        self.with_scope(|scope, ctx| scope.flush_pending(ctx));
    }

    /// Skips `{\*\unknown ...}`.
    fn skip_if_ignorable(&mut self) -> Result<(), Interrupt> {
        let flagged = self.cursor.lookback(1).is_some_and(Token::is_ignore_flag)
            && self.cursor.lookback(2).is_some_and(Token::is_group_open);
        if flagged {
            self.skip_group()?;
        }
        Ok(())
    }

    /// Consumes the rest of the current group and leaves its closing brace
    /// to be read next.
    fn skip_group(&mut self) -> Result<(), Interrupt> {
        let start = self.cursor.current_index();
        let mut depth = 0usize;
        loop {
            match self.cursor.next()? {
                Token::GroupOpen => depth += 1,
                Token::GroupClose => {
                    if depth == 0 {
                        self.cursor.back(1);
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        self.stats.groups_skipped += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "rtf.parser",
            "skipped group tokens {start}..{}",
            self.cursor.position()
        );
        #[cfg(not(any(test, feature = "debug-stats")))]
        let _ = start;
        Ok(())
    }
}

/// Table ids are 16-bit; out-of-range values clamp.
fn clamp_id(param: Option<i32>) -> u16 {
    param.unwrap_or(0).clamp(0, i32::from(u16::MAX)) as u16
}
