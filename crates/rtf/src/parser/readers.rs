//! Color, font and style table readers.
//!
//! Each reader runs from just after its destination word to the group's
//! closing brace, which it leaves for the dispatch loop. Reader state is
//! cloned into the checkpoint at entry boundaries so a streaming rewind
//! resumes mid-table.

use crate::attr::AttrSet;
use crate::charset::TextEncoding;
use crate::document::DocumentSink;
use crate::tables::{ColorRecord, FontFamily, FontPitch, FontRecord, StyleRecord};
use crate::token::{ControlWord, Token};

use super::attrs::AttrTarget;
use super::cursor::Interrupt;
use super::{Flow, Resume, RtfParser, clamp_id};

/// Trims surrounding spaces and one trailing `;` from a table entry name.
pub(super) fn clean_name(raw: &str) -> &str {
    let name = raw.trim_matches(' ');
    name.strip_suffix(';').unwrap_or(name)
}

/// Channels of the color entry being read. `None` is a channel no word set.
#[derive(Clone, Debug, Default)]
pub(super) struct ColorReader {
    red: Option<u8>,
    green: Option<u8>,
    blue: Option<u8>,
}

impl ColorReader {
    /// Completes the entry at a `;`. The leading entry with no channels is
    /// the automatic color.
    fn take(&mut self, first: bool) -> ColorRecord {
        let record = if first && self.red.is_none() && self.green.is_none() && self.blue.is_none() {
            ColorRecord::Auto
        } else {
            ColorRecord::Rgb {
                red: self.red.unwrap_or(u8::MAX),
                green: self.green.unwrap_or(u8::MAX),
                blue: self.blue.unwrap_or(u8::MAX),
            }
        };
        self.red = Some(0);
        self.green = Some(0);
        self.blue = Some(0);
        record
    }
}

#[derive(Clone, Debug)]
pub(super) struct FontReader {
    depth: usize,
    font_no: u16,
    /// Id the completed entry is stored under.
    ins_no: u16,
    alt: bool,
    name: String,
    alt_name: String,
    record: FontRecord,
    /// Decodes entry names; follows the last `\fcharset`.
    encoding: TextEncoding,
    system: TextEncoding,
}

impl FontReader {
    pub(super) fn new(system: TextEncoding) -> Self {
        Self {
            depth: 1,
            font_no: 0,
            ins_no: 0,
            alt: false,
            name: String::new(),
            alt_name: String::new(),
            record: FontRecord {
                encoding: Some(system),
                ..FontRecord::default()
            },
            encoding: system,
            system,
        }
    }

    fn take(&mut self) -> FontRecord {
        let mut record = std::mem::replace(
            &mut self.record,
            FontRecord {
                encoding: Some(self.system),
                ..FontRecord::default()
            },
        );
        record.name = std::mem::take(&mut self.name);
        let alt_name = std::mem::take(&mut self.alt_name);
        if !alt_name.is_empty() {
            record.name.push(';');
            record.name.push_str(&alt_name);
        }
        record
    }
}

#[derive(Clone, Debug)]
pub(super) struct StyleReader {
    depth: usize,
    id: Option<u16>,
    style: StyleRecord,
    defaults: AttrSet,
}

impl StyleReader {
    pub(super) fn new(defaults: AttrSet) -> Self {
        Self {
            depth: 1,
            id: None,
            style: fresh_style(&defaults),
            defaults,
        }
    }
}

fn fresh_style(defaults: &AttrSet) -> StyleRecord {
    StyleRecord {
        attrs: defaults.clone(),
        ..StyleRecord::default()
    }
}

impl<D: DocumentSink> RtfParser<D> {
    pub(super) fn read_color_table(&mut self, mut reader: ColorReader) -> Result<Flow, Interrupt> {
        loop {
            match self.cursor.next()? {
                Token::GroupClose => {
                    self.cursor.back(1);
                    break;
                }
                Token::GroupOpen => return Err(self.malformed()),
                Token::Control { word, param } => {
                    let slot = match word {
                        ControlWord::Red => &mut reader.red,
                        ControlWord::Green => &mut reader.green,
                        ControlWord::Blue => &mut reader.blue,
                        _ => continue,
                    };
                    let Some(value) = param else {
                        return Err(self.malformed());
                    };
                    *slot = Some(value.clamp(0, i32::from(u8::MAX)) as u8);
                }
                Token::Text(text) => {
                    let entries = text
                        .decode(TextEncoding::Unknown)
                        .bytes()
                        .filter(|&b| b == b';')
                        .count();
                    for _ in 0..entries {
                        let record = reader.take(self.colors.is_empty());
                        self.colors.push(record);
                    }
                    self.save_checkpoint(Resume::ColorTable(reader.clone()));
                }
                _ => {}
            }
        }
        log::debug!(target: "rtf.tables", "color table: {} entries", self.colors.len());
        Ok(Flow::Continue)
    }

    pub(super) fn read_font_table(&mut self, mut reader: FontReader) -> Result<Flow, Interrupt> {
        while reader.depth > 0 {
            let mut check_new = false;
            match self.cursor.next()? {
                Token::GroupClose => {
                    reader.alt = false;
                    reader.depth -= 1;
                    check_new = true;
                    reader.ins_no = reader.font_no;
                }
                Token::GroupOpen => {
                    if self.open_table_group(|token| {
                        matches!(
                            token,
                            Token::Unknown { .. }
                                | Token::Control {
                                    word: ControlWord::Panose
                                        | ControlWord::FName
                                        | ControlWord::FontEmb
                                        | ControlWord::FontFile,
                                    ..
                                }
                        )
                    })? {
                        reader.depth += 1;
                    }
                }
                Token::Control { word, param } => match word {
                    ControlWord::FRoman => reader.record.family = FontFamily::Roman,
                    ControlWord::FSwiss => reader.record.family = FontFamily::Swiss,
                    ControlWord::FModern => reader.record.family = FontFamily::Modern,
                    ControlWord::FScript => reader.record.family = FontFamily::Script,
                    ControlWord::FDecor => reader.record.family = FontFamily::Decorative,
                    ControlWord::FTech => {
                        reader.record.family = FontFamily::DontKnow;
                        reader.record.encoding = Some(TextEncoding::Unknown);
                    }
                    ControlWord::FNil => reader.record.family = FontFamily::DontKnow,
                    ControlWord::FCharset => {
                        if let Some(charset) = param
                            && charset != -1
                        {
                            let encoding = u8::try_from(charset)
                                .ok()
                                .and_then(TextEncoding::from_windows_charset);
                            reader.record.encoding = encoding;
                            reader.encoding = encoding.unwrap_or(self.encoding);
                        }
                    }
                    ControlWord::FPrq => {
                        reader.record.pitch = match param {
                            Some(1) => FontPitch::Fixed,
                            Some(2) => FontPitch::Variable,
                            _ => FontPitch::DontKnow,
                        };
                    }
                    ControlWord::FAlt => reader.alt = true,
                    ControlWord::F => {
                        let Some(id) = param else {
                            return Err(self.malformed());
                        };
                        check_new = true;
                        reader.ins_no = reader.font_no;
                        reader.font_no = clamp_id(Some(id));
                    }
                    _ => {}
                },
                Token::Text(text) => {
                    let decoded = text.decode(reader.encoding);
                    let name = clean_name(&decoded);
                    if !name.is_empty() {
                        let slot = if reader.alt {
                            &mut reader.alt_name
                        } else {
                            &mut reader.name
                        };
                        *slot = name.to_string();
                    }
                }
                _ => {}
            }

            if check_new && reader.depth <= 1 && !reader.name.is_empty() {
                let id = reader.ins_no;
                let font = reader.take();
                #[cfg(any(test, feature = "debug-stats"))]
                log::trace!(target: "rtf.tables", "font {id}: {font}");
                self.fonts.insert(id, font);
            }
            if check_new && reader.depth == 1 {
                self.save_checkpoint(Resume::FontTable(reader.clone()));
            }
        }
        self.cursor.back(1);
        if self.config.new_document {
            let id = std::mem::take(&mut self.pending_default_font);
            self.set_default_font(id);
        }
        log::debug!(target: "rtf.tables", "font table: {} entries", self.fonts.len());
        Ok(Flow::Continue)
    }

    pub(super) fn read_style_sheet(&mut self, mut reader: StyleReader) -> Result<Flow, Interrupt> {
        while reader.depth > 0 {
            match self.cursor.next()? {
                Token::GroupClose => {
                    reader.depth -= 1;
                    if reader.depth > 0 {
                        self.save_checkpoint(Resume::StyleSheet(reader.clone()));
                    }
                }
                Token::GroupOpen => {
                    let skip = |token: &Token| {
                        matches!(
                            token,
                            Token::Unknown { .. }
                                | Token::Control {
                                    word: ControlWord::Pn,
                                    ..
                                }
                        )
                    };
                    if self.open_table_group(skip)? {
                        reader.depth += 1;
                    }
                }
                Token::Control { word, param } => match word {
                    ControlWord::SBasedOn => reader.style.based_on = Some(clamp_id(param)),
                    ControlWord::SNext => {}
                    ControlWord::OutlineLevel | ControlWord::SOutLvl => {
                        reader.style.outline_level =
                            Some(param.unwrap_or(0).clamp(0, i32::from(u8::MAX)) as u8);
                    }
                    ControlWord::S | ControlWord::Cs => {
                        let Some(id) = param else {
                            return Err(self.malformed());
                        };
                        reader.id = Some(clamp_id(Some(id)));
                    }
                    _ if word.group().is_attribute() => {
                        let flagged = self.cursor.lookback(1).is_some_and(Token::is_ignore_flag);
                        let mut target = AttrTarget::Style(&mut reader.style);
                        if word.is_writer_extension() {
                            if flagged {
                                self.read_from_flag(&mut target)?;
                            }
                        } else {
                            self.read_attr(Token::control(word, param), &mut target)?;
                        }
                    }
                    _ => {}
                },
                Token::Text(text) => {
                    if let Some(id) = reader.id.take() {
                        let decoded = text.decode(self.encoding);
                        let mut style =
                            std::mem::replace(&mut reader.style, fresh_style(&reader.defaults));
                        style.name = clean_name(&decoded).to_string();
                        #[cfg(any(test, feature = "debug-stats"))]
                        log::trace!(target: "rtf.tables", "style {id}: {:?}", style.name);
                        self.styles.insert(id, style);
                    }
                }
                _ => {}
            }
        }
        self.cursor.back(1);
        self.check_style_attrs = self.config.check_style_attrs;
        log::debug!(target: "rtf.tables", "style sheet: {} entries", self.styles.len());
        Ok(Flow::Continue)
    }

    /// A `{` inside a table. Returns true when it opens a nested level.
    /// `{\*\word ...}` groups whose word matches `skip` are consumed whole
    /// and must end right after their content.
    fn open_table_group(&mut self, skip: impl Fn(&Token) -> bool) -> Result<bool, Interrupt> {
        if !self.cursor.next()?.is_ignore_flag() {
            self.cursor.back(1);
            return Ok(true);
        }
        let word = self.cursor.next()?;
        if !skip(&word) {
            self.cursor.back(2);
            return Ok(true);
        }
        self.skip_group()?;
        if !self.cursor.next()?.is_group_close() {
            return Err(self.malformed());
        }
        Ok(false)
    }
}
