//! Streaming RTF tokenizer.
//!
//! Bytes are appended with `push_bytes` and complete tokens are taken with
//! `drain_tokens`. A construct cut by a chunk boundary (a control word, its
//! parameter, a hex escape, a `\bin` payload) is left in the buffer until the
//! rest arrives.
//!
//! Invariants:
//! - Chunk-equivalence: feeding the input whole or split at any byte
//!   boundaries yields the same token sequence.
//! - Text runs stay undecoded. Adjacent text, `\'hh` escapes and `\uN`
//!   characters accumulate into one `Token::Text` until a structural token
//!   or the end of the stream.

use crate::token::{ControlWord, RawText, Token};


#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Longer control-word names are reported as unknown.
    pub max_word_len: usize,
    /// Digits beyond this are consumed but do not change the parameter.
    pub max_param_digits: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_word_len: 32,
            max_param_digits: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenizeResult {
    /// Bytes were consumed; tokens may be available.
    Progress,
    /// Nothing could be consumed without more input.
    NeedMoreInput,
    /// `finish()` ran; all input is consumed.
    EndOfStream,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub tokens_emitted: u64,
    pub bytes_consumed: u64,
    pub incomplete_waits: u64,
}

enum Step {
    Progress,
    NeedMoreInput,
}

/// What a complete control word turned into.
enum WordAction {
    Unicode(char),
    SetFallbackCount(u32),
    Binary(usize),
    Emit(Token),
}

pub struct RtfTokenizer {
    config: TokenizerConfig,
    buffer: Vec<u8>,
    cursor: usize,
    tokens: Vec<Token>,
    text: RawText,
    /// Fallback characters that follow each `\uN`, scoped per group.
    uc: u32,
    uc_stack: Vec<u32>,
    fallback_skip: u32,
    end_of_stream: bool,
    stats: TokenizerStats,
}

impl Default for RtfTokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl RtfTokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            cursor: 0,
            tokens: Vec::new(),
            text: RawText::new(),
            uc: 1,
            uc_stack: Vec::new(),
            fallback_skip: 0,
            end_of_stream: false,
            stats: TokenizerStats::default(),
        }
    }

    /// Appends `bytes` and tokenizes as far as the buffered input allows.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> TokenizeResult {
        assert!(
            !self.end_of_stream,
            "RtfTokenizer::push_bytes called after finish(); this violates end-of-stream contract"
        );
        self.buffer.extend_from_slice(bytes);
        self.pump()
    }

    /// Marks end of stream, consumes everything left and flushes pending text.
    pub fn finish(&mut self) -> TokenizeResult {
        if !self.end_of_stream {
            self.end_of_stream = true;
            self.pump();
            self.flush_text();
            debug_assert!(self.buffer.is_empty(), "finish left unconsumed bytes");
        }
        TokenizeResult::EndOfStream
    }

    pub fn drain_tokens(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.tokens)
    }

    pub fn is_finished(&self) -> bool {
        self.end_of_stream
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    fn pump(&mut self) -> TokenizeResult {
        let initial_cursor = self.cursor;
        loop {
            self.stats.steps = self.stats.steps.saturating_add(1);
            match self.step() {
                Step::Progress => {}
                Step::NeedMoreInput => break,
            }
        }
        let consumed = self.cursor - initial_cursor;
        self.stats.bytes_consumed += consumed as u64;
        if self.cursor < self.buffer.len() {
            self.stats.incomplete_waits += 1;
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(
                target: "rtf.tokenizer",
                "waiting for more input: {} bytes buffered",
                self.buffer.len() - self.cursor
            );
        }
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        if consumed > 0 {
            TokenizeResult::Progress
        } else {
            TokenizeResult::NeedMoreInput
        }
    }

    fn step(&mut self) -> Step {
        let Some(&byte) = self.buffer.get(self.cursor) else {
            return Step::NeedMoreInput;
        };
        match byte {
            b'{' => {
                self.cursor += 1;
                self.fallback_skip = 0;
                self.uc_stack.push(self.uc);
                self.emit(Token::GroupOpen);
            }
            b'}' => {
                self.cursor += 1;
                self.fallback_skip = 0;
                if let Some(uc) = self.uc_stack.pop() {
                    self.uc = uc;
                }
                self.emit(Token::GroupClose);
            }
            b'\r' | b'\n' => self.cursor += 1,
            b'\\' => return self.step_control(),
            _ => self.step_text(),
        }
        Step::Progress
    }

    fn step_text(&mut self) {
        let start = self.cursor;
        let run = &self.buffer[start..];
        let len = memchr::memchr3(b'\\', b'{', b'}', run).unwrap_or(run.len());
        let mut run = &run[..len];
        while let Some((&first, rest)) = run.split_first() {
            if first == b'\r' || first == b'\n' {
                run = rest;
                continue;
            }
            if self.fallback_skip > 0 {
                self.fallback_skip -= 1;
                run = rest;
                continue;
            }
            let piece = memchr::memchr2(b'\r', b'\n', run).unwrap_or(run.len());
            self.text.push_bytes(&run[..piece]);
            run = &run[piece..];
        }
        self.cursor = start + len;
    }

    fn step_control(&mut self) -> Step {
        let start = self.cursor;
        let Some(&next) = self.buffer.get(start + 1) else {
            if self.end_of_stream {
                // Trailing lone backslash.
                self.cursor = start + 1;
                return Step::Progress;
            }
            return Step::NeedMoreInput;
        };
        if next.is_ascii_alphabetic() {
            return self.step_control_word(start);
        }
        if next == b'\'' {
            return self.step_hex_escape(start);
        }

        self.cursor = start + 2;
        match next {
            b'*' => self.emit(Token::IgnoreFlag),
            b'\\' | b'{' | b'}' => {
                if !self.take_fallback() {
                    self.text.push_byte(next);
                }
            }
            b'~' => self.push_text_char('\u{A0}'),
            b'-' => self.push_text_char('\u{AD}'),
            b'_' => self.push_text_char('\u{2011}'),
            b'\r' | b'\n' => self.emit_unless_fallback(Token::control(ControlWord::Par, None)),
            b':' => self.emit_unless_fallback(Token::control(ControlWord::SubEntry, None)),
            _ => {
                let name = char::from(next).to_string().into_boxed_str();
                self.emit_unless_fallback(Token::Unknown { name, param: None });
            }
        }
        Step::Progress
    }

    fn step_hex_escape(&mut self, start: usize) -> Step {
        let mut value = 0u8;
        let mut digits = 0;
        while digits < 2 {
            match self.buffer.get(start + 2 + digits) {
                Some(&b) => match hex_value(b) {
                    Some(v) => {
                        value = (value << 4) | v;
                        digits += 1;
                    }
                    None => break,
                },
                None if self.end_of_stream => break,
                None => return Step::NeedMoreInput,
            }
        }
        self.cursor = start + 2 + digits;
        if digits > 0 && !self.take_fallback() {
            self.text.push_byte(value);
        }
        Step::Progress
    }

    fn step_control_word(&mut self, start: usize) -> Step {
        let name_start = start + 1;
        let mut index = name_start;
        loop {
            match self.buffer.get(index) {
                Some(b) if b.is_ascii_alphabetic() => index += 1,
                Some(_) => break,
                None if self.end_of_stream => break,
                None => return Step::NeedMoreInput,
            }
        }
        let name_end = index;

        let mut negative = false;
        if self.buffer.get(index) == Some(&b'-') {
            match self.buffer.get(index + 1) {
                Some(b) if b.is_ascii_digit() => {
                    negative = true;
                    index += 1;
                }
                Some(_) => {}
                None if self.end_of_stream => {}
                None => return Step::NeedMoreInput,
            }
        }

        let mut value: i64 = 0;
        let mut digits = 0;
        loop {
            match self.buffer.get(index) {
                Some(b) if b.is_ascii_digit() => {
                    if digits < self.config.max_param_digits {
                        value = value * 10 + i64::from(b - b'0');
                    }
                    digits += 1;
                    index += 1;
                }
                Some(_) => break,
                None if self.end_of_stream => break,
                None => return Step::NeedMoreInput,
            }
        }
        let param = (digits > 0).then(|| {
            let value = if negative { -value } else { value };
            value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        });

        match self.buffer.get(index) {
            Some(b' ') => index += 1,
            Some(_) => {}
            None if self.end_of_stream => {}
            None => return Step::NeedMoreInput,
        }

        let action = self.word_action(&self.buffer[name_start..name_end], param);
        if let WordAction::Binary(len) = action {
            let available = self.buffer.len() - index;
            if available < len && !self.end_of_stream {
                return Step::NeedMoreInput;
            }
            let end = index + len.min(available);
            let payload = self.buffer[index..end].to_vec();
            self.cursor = end;
            self.emit(Token::Binary(payload));
            return Step::Progress;
        }

        self.cursor = index;
        match action {
            WordAction::Unicode(ch) => {
                self.text.push_char(ch);
                self.fallback_skip = self.uc;
            }
            WordAction::SetFallbackCount(count) => self.uc = count,
            WordAction::Emit(token) => self.emit_unless_fallback(token),
            WordAction::Binary(_) => {}
        }
        Step::Progress
    }

    fn word_action(&self, name: &[u8], param: Option<i32>) -> WordAction {
        match name {
            b"u" => {
                let code = param.unwrap_or(0);
                let code = if code < 0 { code + 0x1_0000 } else { code };
                let ch = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                WordAction::Unicode(ch)
            }
            b"uc" => WordAction::SetFallbackCount(param.unwrap_or(1).max(0) as u32),
            b"bin" => WordAction::Binary(param.unwrap_or(0).max(0) as usize),
            _ => {
                let word = (name.len() <= self.config.max_word_len)
                    .then(|| ControlWord::lookup(name))
                    .flatten();
                let token = match word {
                    Some(word) => Token::control(word, param),
                    None => Token::Unknown {
                        name: String::from_utf8_lossy(name).into(),
                        param,
                    },
                };
                WordAction::Emit(token)
            }
        }
    }

    /// Consumes one pending `\uN` fallback character, if any.
    fn take_fallback(&mut self) -> bool {
        if self.fallback_skip > 0 {
            self.fallback_skip -= 1;
            true
        } else {
            false
        }
    }

    fn push_text_char(&mut self, ch: char) {
        if !self.take_fallback() {
            self.text.push_char(ch);
        }
    }

    fn emit_unless_fallback(&mut self, token: Token) {
        if !self.take_fallback() {
            self.emit(token);
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        self.push_token(Token::Text(text));
    }

    fn emit(&mut self, token: Token) {
        self.flush_text();
        self.push_token(token);
    }

    fn push_token(&mut self, token: Token) {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "rtf.tokenizer", "emit {token}");
        self.stats.tokens_emitted += 1;
        self.tokens.push(token);
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Tokenizes a complete input in one call.
pub fn tokenize(input: &[u8]) -> Vec<Token> {
    let mut tokenizer = RtfTokenizer::default();
    tokenizer.push_bytes(input);
    tokenizer.finish();
    tokenizer.drain_tokens()
}
