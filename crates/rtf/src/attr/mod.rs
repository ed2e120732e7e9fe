//! Attribute keys, values and sparse attribute sets.
//!
//! Keys fall into two categories: character attributes, which follow text,
//! and paragraph attributes, which apply to whole paragraphs and are cut at
//! paragraph boundaries when a scope closes.

use std::fmt;

mod pool;
pub(crate) mod reader;
mod set;

pub use pool::AttrPool;
pub use set::{AttrSet, AttrState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrKey {
    // character
    Weight,
    Posture,
    Underline,
    Strikeout,
    CaseMap,
    Contour,
    Shadowed,
    Hidden,
    Font,
    FontHeight,
    Color,
    Highlight,
    Escapement,
    Raise,
    Kerning,
    Language,
    // paragraph
    Adjust,
    LeftIndent,
    RightIndent,
    FirstLineIndent,
    SpaceBefore,
    SpaceAfter,
    LineSpacing,
    KeepTogether,
    KeepWithNext,
    OutlineLevel,
    Direction,
    TabStops,
    DefaultTabStop,
    Borders,
    BorderShadow,
    PageBreakBefore,
    PageDescriptor,
    ScriptSpace,
}

impl AttrKey {
    pub const CHARACTER: &'static [AttrKey] = &[
        AttrKey::Weight,
        AttrKey::Posture,
        AttrKey::Underline,
        AttrKey::Strikeout,
        AttrKey::CaseMap,
        AttrKey::Contour,
        AttrKey::Shadowed,
        AttrKey::Hidden,
        AttrKey::Font,
        AttrKey::FontHeight,
        AttrKey::Color,
        AttrKey::Highlight,
        AttrKey::Escapement,
        AttrKey::Raise,
        AttrKey::Kerning,
        AttrKey::Language,
    ];

    /// Paragraph keys reset by `\pard`. Document-wide keys are not included.
    pub const PARAGRAPH_FORMAT: &'static [AttrKey] = &[
        AttrKey::Adjust,
        AttrKey::LeftIndent,
        AttrKey::RightIndent,
        AttrKey::FirstLineIndent,
        AttrKey::SpaceBefore,
        AttrKey::SpaceAfter,
        AttrKey::LineSpacing,
        AttrKey::KeepTogether,
        AttrKey::KeepWithNext,
        AttrKey::OutlineLevel,
        AttrKey::Direction,
        AttrKey::TabStops,
        AttrKey::Borders,
        AttrKey::BorderShadow,
        AttrKey::PageBreakBefore,
        AttrKey::PageDescriptor,
    ];

    pub fn is_paragraph(self) -> bool {
        self >= AttrKey::Adjust
    }

    pub fn name(self) -> &'static str {
        match self {
            AttrKey::Weight => "bold",
            AttrKey::Posture => "italic",
            AttrKey::Underline => "underline",
            AttrKey::Strikeout => "strike",
            AttrKey::CaseMap => "case",
            AttrKey::Contour => "outline",
            AttrKey::Shadowed => "shadow",
            AttrKey::Hidden => "hidden",
            AttrKey::Font => "font",
            AttrKey::FontHeight => "size",
            AttrKey::Color => "color",
            AttrKey::Highlight => "highlight",
            AttrKey::Escapement => "script",
            AttrKey::Raise => "raise",
            AttrKey::Kerning => "kerning",
            AttrKey::Language => "lang",
            AttrKey::Adjust => "adjust",
            AttrKey::LeftIndent => "li",
            AttrKey::RightIndent => "ri",
            AttrKey::FirstLineIndent => "fi",
            AttrKey::SpaceBefore => "sb",
            AttrKey::SpaceAfter => "sa",
            AttrKey::LineSpacing => "sl",
            AttrKey::KeepTogether => "keep",
            AttrKey::KeepWithNext => "keepn",
            AttrKey::OutlineLevel => "outlinelevel",
            AttrKey::Direction => "dir",
            AttrKey::TabStops => "tabs",
            AttrKey::DefaultTabStop => "deftab",
            AttrKey::Borders => "borders",
            AttrKey::BorderShadow => "brdrshadow",
            AttrKey::PageBreakBefore => "pgbrk",
            AttrKey::PageDescriptor => "pgdsc",
            AttrKey::ScriptSpace => "scriptspace",
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Dotted,
    Words,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strike {
    #[default]
    None,
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaseMap {
    #[default]
    Normal,
    Upper,
    SmallCaps,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptPosition {
    #[default]
    Baseline,
    Super,
    Sub,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Adjust {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TabAlign {
    #[default]
    Left,
    Center,
    Right,
    Decimal,
    Bar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabStop {
    pub position: i32,
    pub align: TabAlign,
}

/// Tab stops ordered by position; one stop per position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TabStops(Vec<TabStop>);

impl TabStops {
    pub fn insert(&mut self, stop: TabStop) {
        match self
            .0
            .binary_search_by_key(&stop.position, |existing| existing.position)
        {
            Ok(index) => self.0[index] = stop,
            Err(index) => self.0.insert(index, stop),
        }
    }

    pub fn as_slice(&self) -> &[TabStop] {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    Single,
    Thick,
    Double,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BorderLine {
    pub style: BorderStyle,
    pub width: i32,
    pub color: u16,
    pub spacing: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Borders {
    pub top: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
    pub left: Option<BorderLine>,
    pub right: Option<BorderLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Underline(Underline),
    Strike(Strike),
    CaseMap(CaseMap),
    Script(ScriptPosition),
    Adjust(Adjust),
    Direction(Direction),
    Tabs(TabStops),
    Borders(Borders),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttrValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(value) => write!(f, "{value}"),
            AttrValue::Int(value) => write!(f, "{value}"),
            AttrValue::Underline(value) => f.write_str(&lowercase_debug(value)),
            AttrValue::Strike(value) => f.write_str(&lowercase_debug(value)),
            AttrValue::CaseMap(value) => f.write_str(&lowercase_debug(value)),
            AttrValue::Script(value) => f.write_str(&lowercase_debug(value)),
            AttrValue::Adjust(value) => f.write_str(&lowercase_debug(value)),
            AttrValue::Direction(Direction::LeftToRight) => f.write_str("ltr"),
            AttrValue::Direction(Direction::RightToLeft) => f.write_str("rtl"),
            AttrValue::Tabs(stops) => {
                f.write_str("[")?;
                for (i, stop) in stops.as_slice().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let align = lowercase_debug(&stop.align);
                    write!(f, "{}{}", stop.position, &align[..1])?;
                }
                f.write_str("]")
            }
            AttrValue::Borders(borders) => {
                let sides = [
                    ('t', borders.top),
                    ('b', borders.bottom),
                    ('l', borders.left),
                    ('r', borders.right),
                ];
                f.write_str("[")?;
                let mut first = true;
                for (side, line) in sides {
                    let Some(line) = line else {
                        continue;
                    };
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    let style = lowercase_debug(&line.style);
                    write!(f, "{side}:{style}/{}/{}", line.width, line.color)?;
                    if line.spacing != 0 {
                        write!(f, "/{}", line.spacing)?;
                    }
                }
                f.write_str("]")
            }
        }
    }
}

fn lowercase_debug(value: &impl fmt::Debug) -> String {
    format!("{value:?}").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_keys_start_at_adjust() {
        for key in AttrKey::CHARACTER {
            assert!(!key.is_paragraph(), "{key} classified as paragraph");
        }
        for key in AttrKey::PARAGRAPH_FORMAT {
            assert!(key.is_paragraph(), "{key} classified as character");
        }
        assert!(AttrKey::ScriptSpace.is_paragraph());
    }

    #[test]
    fn tab_stops_replace_by_position() {
        let mut stops = TabStops::default();
        for (position, align) in [
            (1440, TabAlign::Left),
            (720, TabAlign::Right),
            (1440, TabAlign::Center),
        ] {
            stops.insert(TabStop { position, align });
        }
        assert_eq!(AttrValue::Tabs(stops).to_string(), "[720r,1440c]");
    }

    #[test]
    fn border_display_lists_present_sides() {
        let line = BorderLine {
            style: BorderStyle::Double,
            width: 15,
            color: 2,
            spacing: 0,
        };
        let borders = Borders {
            top: Some(line),
            left: Some(line),
            ..Borders::default()
        };
        assert_eq!(
            AttrValue::Borders(borders).to_string(),
            "[t:double/15/2,l:double/15/2]"
        );
    }
}
