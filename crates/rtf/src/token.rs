//! Token model shared by the tokenizer and the parser.
//!
//! Control words are resolved once, at tokenization time, into `ControlWord`
//! variants. Handlers never switch on raw names; they switch on `TokenGroup`
//! (the category a word belongs to) and then on the word itself.

use std::fmt;

use crate::charset::TextEncoding;

/// One lexical unit of an RTF stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    GroupOpen,
    GroupClose,
    /// `\*`: the following destination may be skipped if it is not understood.
    IgnoreFlag,
    Control {
        word: ControlWord,
        param: Option<i32>,
    },
    Unknown {
        name: Box<str>,
        param: Option<i32>,
    },
    Text(RawText),
    Binary(Vec<u8>),
}

impl Token {
    pub fn control(word: ControlWord, param: Option<i32>) -> Self {
        Token::Control { word, param }
    }

    pub fn is_group_open(&self) -> bool {
        matches!(self, Token::GroupOpen)
    }

    pub fn is_group_close(&self) -> bool {
        matches!(self, Token::GroupClose)
    }

    pub fn is_ignore_flag(&self) -> bool {
        matches!(self, Token::IgnoreFlag)
    }

    pub fn word(&self) -> Option<ControlWord> {
        match self {
            Token::Control { word, .. } => Some(*word),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::GroupOpen => f.write_str("{"),
            Token::GroupClose => f.write_str("}"),
            Token::IgnoreFlag => f.write_str("\\*"),
            Token::Control { word, param } => {
                write!(f, "\\{}", word.name())?;
                if let Some(value) = param {
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            Token::Unknown { name, param } => {
                write!(f, "\\?{name}")?;
                if let Some(value) = param {
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            Token::Text(text) => {
                let decoded = text.decode(TextEncoding::Unknown);
                write!(f, "{decoded:?}")
            }
            Token::Binary(bytes) => write!(f, "bin({})", bytes.len()),
        }
    }
}

/// Piece of a text run: raw code-page bytes, or a character that was already
/// resolved (`\uN`, `\~`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextPiece {
    Bytes(Vec<u8>),
    Char(char),
}

/// Undecoded text run.
///
/// Decoding is deferred to the parser because the active charset depends on
/// font state the tokenizer cannot see.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawText {
    pieces: Vec<TextPiece>,
}

impl RawText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut text = Self::new();
        text.push_bytes(bytes);
        text
    }

    pub fn push_byte(&mut self, byte: u8) {
        if let Some(TextPiece::Bytes(bytes)) = self.pieces.last_mut() {
            bytes.push(byte);
        } else {
            self.pieces.push(TextPiece::Bytes(vec![byte]));
        }
    }

    pub fn push_bytes(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if let Some(TextPiece::Bytes(bytes)) = self.pieces.last_mut() {
            bytes.extend_from_slice(data);
        } else {
            self.pieces.push(TextPiece::Bytes(data.to_vec()));
        }
    }

    pub fn push_char(&mut self, ch: char) {
        self.pieces.push(TextPiece::Char(ch));
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn pieces(&self) -> &[TextPiece] {
        &self.pieces
    }

    pub fn contains_byte(&self, needle: u8) -> bool {
        self.pieces.iter().any(|piece| match piece {
            TextPiece::Bytes(bytes) => memchr::memchr(needle, bytes).is_some(),
            TextPiece::Char(ch) => u32::from(*ch) == u32::from(needle),
        })
    }

    pub fn decode(&self, encoding: TextEncoding) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                TextPiece::Bytes(bytes) => encoding.decode_into(bytes, &mut out),
                TextPiece::Char(ch) => out.push(*ch),
            }
        }
        out
    }
}

/// Category of a control word. Dispatch is driven by these groupings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenGroup {
    Document,
    Destination,
    FontDef,
    ColorDef,
    StyleDef,
    SpecialChar,
    CharFormat,
    ParaFormat,
    BorderDef,
    TabStopDef,
}

impl TokenGroup {
    /// Groups read by the attribute reader.
    pub fn is_attribute(self) -> bool {
        matches!(
            self,
            TokenGroup::CharFormat
                | TokenGroup::ParaFormat
                | TokenGroup::BorderDef
                | TokenGroup::TabStopDef
        )
    }
}

/// Control words understood by the parser. Everything else is
/// `Token::Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlWord {
    // document
    Rtf,
    Ansi,
    AnsiCpg,
    Mac,
    Pc,
    Pca,
    Deff,
    DefTab,
    DefLang,
    // destinations
    FontTable,
    ColorTable,
    StyleSheet,
    Info,
    Pict,
    Field,
    Annotation,
    AtnId,
    BkmkStart,
    BkmkEnd,
    BkmkKey,
    Xe,
    Tc,
    NextFile,
    Template,
    PrtData,
    // font table
    FRoman,
    FSwiss,
    FModern,
    FScript,
    FDecor,
    FTech,
    FNil,
    FCharset,
    FPrq,
    FAlt,
    Panose,
    FName,
    FontEmb,
    FontFile,
    // color table
    Red,
    Green,
    Blue,
    // stylesheet
    SBasedOn,
    SNext,
    SOutLvl,
    Pn,
    // single characters
    Par,
    Line,
    Tab,
    SubEntry,
    EmDash,
    EnDash,
    Bullet,
    LQuote,
    RQuote,
    LDblQuote,
    RDblQuote,
    // character format
    Plain,
    Bold,
    Italic,
    Ul,
    UlNone,
    UlD,
    UlDb,
    UlW,
    Strike,
    StrikeD,
    Caps,
    SCaps,
    Outl,
    Shad,
    Hidden,
    F,
    Fs,
    Cf,
    Cb,
    Highlight,
    Up,
    Dn,
    Super,
    Sub,
    NoSuperSub,
    Expnd,
    ExpndTw,
    Lang,
    Cs,
    // paragraph format
    Pard,
    Ql,
    Qr,
    Qc,
    Qj,
    Li,
    Ri,
    Fi,
    Sb,
    Sa,
    Sl,
    Keep,
    KeepN,
    OutlineLevel,
    RtlPar,
    LtrPar,
    S,
    PgBrk,
    PgDscNo,
    // borders
    Box,
    BrdrT,
    BrdrB,
    BrdrL,
    BrdrR,
    BrdrS,
    BrdrTh,
    BrdrDb,
    BrdrW,
    BrdrCf,
    BrSp,
    Shadow,
    // tab stops
    Tx,
    Tqr,
    Tqc,
    Tqdec,
    Tb,
}

/// Name table, sorted by name for binary search.
static CONTROL_WORDS: &[(&str, ControlWord)] = &[
    ("annotation", ControlWord::Annotation),
    ("ansi", ControlWord::Ansi),
    ("ansicpg", ControlWord::AnsiCpg),
    ("atnid", ControlWord::AtnId),
    ("b", ControlWord::Bold),
    ("bkmkend", ControlWord::BkmkEnd),
    ("bkmkkey", ControlWord::BkmkKey),
    ("bkmkstart", ControlWord::BkmkStart),
    ("blue", ControlWord::Blue),
    ("box", ControlWord::Box),
    ("brdrb", ControlWord::BrdrB),
    ("brdrcf", ControlWord::BrdrCf),
    ("brdrdb", ControlWord::BrdrDb),
    ("brdrl", ControlWord::BrdrL),
    ("brdrr", ControlWord::BrdrR),
    ("brdrs", ControlWord::BrdrS),
    ("brdrt", ControlWord::BrdrT),
    ("brdrth", ControlWord::BrdrTh),
    ("brdrw", ControlWord::BrdrW),
    ("brsp", ControlWord::BrSp),
    ("bullet", ControlWord::Bullet),
    ("caps", ControlWord::Caps),
    ("cb", ControlWord::Cb),
    ("cf", ControlWord::Cf),
    ("colortbl", ControlWord::ColorTable),
    ("cs", ControlWord::Cs),
    ("deff", ControlWord::Deff),
    ("deflang", ControlWord::DefLang),
    ("deftab", ControlWord::DefTab),
    ("dn", ControlWord::Dn),
    ("emdash", ControlWord::EmDash),
    ("endash", ControlWord::EnDash),
    ("expnd", ControlWord::Expnd),
    ("expndtw", ControlWord::ExpndTw),
    ("f", ControlWord::F),
    ("falt", ControlWord::FAlt),
    ("fcharset", ControlWord::FCharset),
    ("fdecor", ControlWord::FDecor),
    ("fi", ControlWord::Fi),
    ("field", ControlWord::Field),
    ("fmodern", ControlWord::FModern),
    ("fname", ControlWord::FName),
    ("fnil", ControlWord::FNil),
    ("fontemb", ControlWord::FontEmb),
    ("fontfile", ControlWord::FontFile),
    ("fonttbl", ControlWord::FontTable),
    ("fprq", ControlWord::FPrq),
    ("froman", ControlWord::FRoman),
    ("fs", ControlWord::Fs),
    ("fscript", ControlWord::FScript),
    ("fswiss", ControlWord::FSwiss),
    ("ftech", ControlWord::FTech),
    ("green", ControlWord::Green),
    ("highlight", ControlWord::Highlight),
    ("i", ControlWord::Italic),
    ("info", ControlWord::Info),
    ("keep", ControlWord::Keep),
    ("keepn", ControlWord::KeepN),
    ("lang", ControlWord::Lang),
    ("ldblquote", ControlWord::LDblQuote),
    ("li", ControlWord::Li),
    ("line", ControlWord::Line),
    ("lquote", ControlWord::LQuote),
    ("ltrpar", ControlWord::LtrPar),
    ("mac", ControlWord::Mac),
    ("nextfile", ControlWord::NextFile),
    ("nosupersub", ControlWord::NoSuperSub),
    ("outl", ControlWord::Outl),
    ("outlinelevel", ControlWord::OutlineLevel),
    ("panose", ControlWord::Panose),
    ("par", ControlWord::Par),
    ("pard", ControlWord::Pard),
    ("pc", ControlWord::Pc),
    ("pca", ControlWord::Pca),
    ("pgbrk", ControlWord::PgBrk),
    ("pgdscno", ControlWord::PgDscNo),
    ("pict", ControlWord::Pict),
    ("plain", ControlWord::Plain),
    ("pn", ControlWord::Pn),
    ("prtdata", ControlWord::PrtData),
    ("qc", ControlWord::Qc),
    ("qj", ControlWord::Qj),
    ("ql", ControlWord::Ql),
    ("qr", ControlWord::Qr),
    ("rdblquote", ControlWord::RDblQuote),
    ("red", ControlWord::Red),
    ("ri", ControlWord::Ri),
    ("rquote", ControlWord::RQuote),
    ("rtf", ControlWord::Rtf),
    ("rtlpar", ControlWord::RtlPar),
    ("s", ControlWord::S),
    ("sa", ControlWord::Sa),
    ("sb", ControlWord::Sb),
    ("sbasedon", ControlWord::SBasedOn),
    ("scaps", ControlWord::SCaps),
    ("shad", ControlWord::Shad),
    ("shadow", ControlWord::Shadow),
    ("sl", ControlWord::Sl),
    ("snext", ControlWord::SNext),
    ("soutlvl", ControlWord::SOutLvl),
    ("strike", ControlWord::Strike),
    ("striked", ControlWord::StrikeD),
    ("stylesheet", ControlWord::StyleSheet),
    ("sub", ControlWord::Sub),
    ("super", ControlWord::Super),
    ("tab", ControlWord::Tab),
    ("tb", ControlWord::Tb),
    ("tc", ControlWord::Tc),
    ("template", ControlWord::Template),
    ("tqc", ControlWord::Tqc),
    ("tqdec", ControlWord::Tqdec),
    ("tqr", ControlWord::Tqr),
    ("tx", ControlWord::Tx),
    ("ul", ControlWord::Ul),
    ("uld", ControlWord::UlD),
    ("uldb", ControlWord::UlDb),
    ("ulnone", ControlWord::UlNone),
    ("ulw", ControlWord::UlW),
    ("up", ControlWord::Up),
    ("v", ControlWord::Hidden),
    ("xe", ControlWord::Xe),
];

impl ControlWord {
    pub fn lookup(name: &[u8]) -> Option<ControlWord> {
        CONTROL_WORDS
            .binary_search_by(|(candidate, _)| candidate.as_bytes().cmp(name))
            .ok()
            .map(|index| CONTROL_WORDS[index].1)
    }

    pub fn name(self) -> &'static str {
        if self == ControlWord::SubEntry {
            return ":";
        }
        CONTROL_WORDS
            .iter()
            .find(|(_, word)| *word == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }

    pub fn group(self) -> TokenGroup {
        use ControlWord::*;
        match self {
            Rtf | Ansi | AnsiCpg | Mac | Pc | Pca | Deff | DefTab | DefLang => TokenGroup::Document,
            FontTable | ColorTable | StyleSheet | Info | Pict | Field | Annotation | AtnId
            | BkmkStart | BkmkEnd | BkmkKey | Xe | Tc | NextFile | Template | PrtData => {
                TokenGroup::Destination
            }
            FRoman | FSwiss | FModern | FScript | FDecor | FTech | FNil | FCharset | FPrq
            | FAlt | Panose | FName | FontEmb | FontFile => TokenGroup::FontDef,
            Red | Green | Blue => TokenGroup::ColorDef,
            SBasedOn | SNext | SOutLvl | Pn => TokenGroup::StyleDef,
            Par | Line | Tab | SubEntry | EmDash | EnDash | Bullet | LQuote | RQuote
            | LDblQuote | RDblQuote => TokenGroup::SpecialChar,
            Plain | Bold | Italic | Ul | UlNone | UlD | UlDb | UlW | Strike | StrikeD | Caps
            | SCaps | Outl | Shad | Hidden | F | Fs | Cf | Cb | Highlight | Up | Dn | Super
            | Sub | NoSuperSub | Expnd | ExpndTw | Lang | Cs => TokenGroup::CharFormat,
            Pard | Ql | Qr | Qc | Qj | Li | Ri | Fi | Sb | Sa | Sl | Keep | KeepN
            | OutlineLevel | RtlPar | LtrPar | S | PgBrk | PgDscNo => TokenGroup::ParaFormat,
            Box | BrdrT | BrdrB | BrdrL | BrdrR | BrdrS | BrdrTh | BrdrDb | BrdrW | BrdrCf
            | BrSp | Shadow => TokenGroup::BorderDef,
            Tx | Tqr | Tqc | Tqdec | Tb => TokenGroup::TabStopDef,
        }
    }

    /// Extension words that are only valid directly behind `\*`.
    pub fn is_writer_extension(self) -> bool {
        matches!(
            self,
            ControlWord::PgDscNo | ControlWord::PgBrk | ControlWord::Shadow
        )
    }

    /// Text produced by single-character words.
    pub fn single_char(self) -> Option<char> {
        match self {
            ControlWord::Line => Some('\n'),
            ControlWord::Tab => Some('\t'),
            ControlWord::SubEntry => Some(':'),
            ControlWord::EmDash => Some('\u{2014}'),
            ControlWord::EnDash => Some('\u{2013}'),
            ControlWord::Bullet => Some('\u{2022}'),
            ControlWord::LQuote => Some('\u{2018}'),
            ControlWord::RQuote => Some('\u{2019}'),
            ControlWord::LDblQuote => Some('\u{201C}'),
            ControlWord::RDblQuote => Some('\u{201D}'),
            _ => None,
        }
    }
}
