//! Attribute word runs.
//!
//! A run starts at an attribute word and extends over further attribute
//! words, `\*`-flagged ones, and nested `{\*\word ...}` groups. Anything else
//! ends it and is left for the caller.

use crate::attr::reader::AttrEffect;
use crate::document::DocumentSink;
use crate::scope::ResolveContext;
use crate::tables::StyleRecord;
use crate::token::{ControlWord, Token};

use super::RtfParser;
use super::cursor::Interrupt;

/// Where a run of attribute words is written.
pub(super) enum AttrTarget<'a> {
    /// Frame of the innermost group, opened on demand.
    Current,
    /// Rest of the group around a just-opened one, from the cursor on.
    Enclosing,
    /// Style sheet entry being read.
    Style(&'a mut StyleRecord),
}

impl AttrTarget<'_> {
    fn in_style(&self) -> bool {
        matches!(self, AttrTarget::Style(_))
    }
}

/// Attribute words a run accepts. Style sheet entries carry their own id and
/// outline level, so those words are not attributes there.
fn accepts(word: ControlWord, in_style: bool) -> bool {
    word.group().is_attribute()
        && !(in_style
            && matches!(
                word,
                ControlWord::S | ControlWord::Cs | ControlWord::OutlineLevel
            ))
}

fn accepts_token(token: &Token, in_style: bool) -> bool {
    token.word().is_some_and(|word| accepts(word, in_style))
}

impl<D: DocumentSink> RtfParser<D> {
    /// Reads an attribute run starting at `first`, which was already taken
    /// from the cursor. The token that ends the run is left unread.
    pub(super) fn read_attr(
        &mut self,
        first: Token,
        target: &mut AttrTarget<'_>,
    ) -> Result<(), Interrupt> {
        let in_style = target.in_style();
        let mut depth = 0usize;
        let mut token = first;
        loop {
            match token {
                Token::Control { word, param } if accepts(word, in_style) => {
                    let flagged = self.cursor.lookback(1).is_some_and(Token::is_ignore_flag);
                    if !word.is_writer_extension() || flagged {
                        self.apply_attr(target, word, param);
                    }
                }
                Token::IgnoreFlag => {
                    let next = self.cursor.next()?;
                    if accepts_token(&next, in_style) {
                        token = next;
                        continue;
                    }
                    self.cursor.back(2);
                    if depth == 0 {
                        break;
                    }
                    self.skip_nested(depth)?;
                    depth = 0;
                }
                Token::GroupOpen => {
                    if self.open_flagged_group(in_style)? {
                        depth += 1;
                        token = self.cursor.next()?;
                        continue;
                    }
                    if depth == 0 {
                        break;
                    }
                    self.skip_nested(depth)?;
                    depth = 0;
                }
                Token::GroupClose if depth > 0 => depth -= 1,
                _ => {
                    self.cursor.back(1);
                    if depth == 0 {
                        break;
                    }
                    self.skip_nested(depth)?;
                    depth = 0;
                }
            }
            token = self.cursor.next()?;
        }
        Ok(())
    }

    /// After a `{`: checks for `\*` plus an accepted word and leaves the word
    /// as the next token if so. Otherwise the `{` is the next token again.
    fn open_flagged_group(&mut self, in_style: bool) -> Result<bool, Interrupt> {
        let flag = self.cursor.next()?;
        if !flag.is_ignore_flag() {
            self.cursor.back(2);
            return Ok(false);
        }
        let word = self.cursor.next()?;
        if accepts_token(&word, in_style) {
            self.cursor.back(1);
            return Ok(true);
        }
        self.cursor.back(3);
        Ok(false)
    }

    /// Skips what is left of `depth` nested flagged groups, closes included.
    fn skip_nested(&mut self, depth: usize) -> Result<(), Interrupt> {
        for _ in 0..depth {
            self.skip_group()?;
            self.cursor.next()?;
        }
        Ok(())
    }

    /// A writer extension word in the body. Without a leading `\*` it is
    /// ignored; after `{\*` it formats what follows in the enclosing group.
    pub(super) fn read_flagged_attr(&mut self) -> Result<(), Interrupt> {
        if !self.cursor.lookback(1).is_some_and(Token::is_ignore_flag) {
            return Ok(());
        }
        let mut target = if self.cursor.lookback(2).is_some_and(Token::is_group_open) {
            AttrTarget::Enclosing
        } else {
            AttrTarget::Current
        };
        self.read_from_flag(&mut target)
    }

    /// Rereads the current word together with its `\*` as an attribute run.
    pub(super) fn read_from_flag(&mut self, target: &mut AttrTarget<'_>) -> Result<(), Interrupt> {
        let entering = self.cursor.position();
        self.cursor.back(2);
        let rewound = self.cursor.position();
        let first = self.cursor.next()?;
        self.read_attr(first, target)?;
        if self.cursor.position() <= rewound {
            // The run handed back everything it read; dispatching from here
            // would reach the same word again.
            self.cursor.seek(entering);
            self.stats.zero_progress_recoveries += 1;
            log::debug!(
                target: "rtf.parser",
                "attribute run made no progress at token {}",
                entering - 1
            );
        }
        Ok(())
    }

    fn apply_attr(&mut self, target: &mut AttrTarget<'_>, word: ControlWord, param: Option<i32>) {
        if let AttrTarget::Style(style) = target {
            // Style references do not nest inside style entries.
            let _ = self
                .attr_reader
                .apply(word, param, &mut style.attrs, &self.pool);
            return;
        }
        self.ensure_defaults();
        let Self {
            scope,
            attr_reader,
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
        let frame = match target {
            AttrTarget::Enclosing => scope.enclosing_frame(&mut ctx),
            _ => scope.current_frame(&mut ctx),
        };
        match attr_reader.apply(word, param, &mut frame.attrs, pool) {
            AttrEffect::StyleRef(id) => frame.style = id,
            AttrEffect::ResetStyle => frame.style = 0,
            AttrEffect::None => {}
        }
    }
}
