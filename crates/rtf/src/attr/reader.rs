//! Maps character, paragraph, border and tab-stop words onto attribute keys.
//!
//! Applying the same word twice leaves the target set unchanged; the parser
//! relies on this when it replays a dispatch step after a streaming rewind.

use crate::token::ControlWord;

use super::{
    Adjust, AttrKey, AttrPool, AttrSet, AttrValue, BorderLine, BorderStyle, Borders, CaseMap,
    Direction, ScriptPosition, Strike, TabAlign, TabStop, TabStops, Underline,
};

const SIDE_TOP: u8 = 1;
const SIDE_BOTTOM: u8 = 2;
const SIDE_LEFT: u8 = 4;
const SIDE_RIGHT: u8 = 8;
const SIDE_ALL: u8 = SIDE_TOP | SIDE_BOTTOM | SIDE_LEFT | SIDE_RIGHT;

/// Side effect of an attribute word that is not an attribute entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttrEffect {
    None,
    StyleRef(u16),
    ResetStyle,
}

/// Pending state for multi-word definitions (`\tqr\tx720`, `\brdrt\brdrs`).
#[derive(Clone, Debug, Default)]
pub(crate) struct AttrReader {
    tab_align: TabAlign,
    border_sides: u8,
}

fn toggle(param: Option<i32>) -> bool {
    param != Some(0)
}

fn style_id(param: Option<i32>) -> u16 {
    param.and_then(|value| u16::try_from(value).ok()).unwrap_or(0)
}

impl AttrReader {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn apply(
        &mut self,
        word: ControlWord,
        param: Option<i32>,
        set: &mut AttrSet,
        pool: &AttrPool,
    ) -> AttrEffect {
        use ControlWord as W;
        let int = |default: i32| AttrValue::Int(param.unwrap_or(default));
        match word {
            W::Plain => {
                reset_keys(AttrKey::CHARACTER, set, pool);
            }
            W::Bold => {
                set.insert(AttrKey::Weight, AttrValue::Bool(toggle(param)));
            }
            W::Italic => {
                set.insert(AttrKey::Posture, AttrValue::Bool(toggle(param)));
            }
            W::Ul => {
                let value = if toggle(param) { Underline::Single } else { Underline::None };
                set.insert(AttrKey::Underline, AttrValue::Underline(value));
            }
            W::UlNone => {
                set.insert(AttrKey::Underline, AttrValue::Underline(Underline::None));
            }
            W::UlD => {
                set.insert(AttrKey::Underline, AttrValue::Underline(Underline::Dotted));
            }
            W::UlDb => {
                set.insert(AttrKey::Underline, AttrValue::Underline(Underline::Double));
            }
            W::UlW => {
                set.insert(AttrKey::Underline, AttrValue::Underline(Underline::Words));
            }
            W::Strike => {
                let value = if toggle(param) { Strike::Single } else { Strike::None };
                set.insert(AttrKey::Strikeout, AttrValue::Strike(value));
            }
            W::StrikeD => {
                let value = if toggle(param) { Strike::Double } else { Strike::None };
                set.insert(AttrKey::Strikeout, AttrValue::Strike(value));
            }
            W::Caps => {
                let value = if toggle(param) { CaseMap::Upper } else { CaseMap::Normal };
                set.insert(AttrKey::CaseMap, AttrValue::CaseMap(value));
            }
            W::SCaps => {
                let value = if toggle(param) { CaseMap::SmallCaps } else { CaseMap::Normal };
                set.insert(AttrKey::CaseMap, AttrValue::CaseMap(value));
            }
            W::Outl => {
                set.insert(AttrKey::Contour, AttrValue::Bool(toggle(param)));
            }
            W::Shad => {
                set.insert(AttrKey::Shadowed, AttrValue::Bool(toggle(param)));
            }
            W::Hidden => {
                set.insert(AttrKey::Hidden, AttrValue::Bool(toggle(param)));
            }
            W::F => {
                set.insert(AttrKey::Font, int(0));
            }
            W::Fs => {
                set.insert(AttrKey::FontHeight, int(24));
            }
            W::Cf => {
                set.insert(AttrKey::Color, int(0));
            }
            W::Cb | W::Highlight => {
                set.insert(AttrKey::Highlight, int(0));
            }
            W::Up => {
                set.insert(AttrKey::Raise, int(6));
            }
            W::Dn => {
                set.insert(AttrKey::Raise, AttrValue::Int(-param.unwrap_or(6)));
            }
            W::Super => {
                set.insert(AttrKey::Escapement, AttrValue::Script(ScriptPosition::Super));
            }
            W::Sub => {
                set.insert(AttrKey::Escapement, AttrValue::Script(ScriptPosition::Sub));
            }
            W::NoSuperSub => {
                set.insert(AttrKey::Escapement, AttrValue::Script(ScriptPosition::Baseline));
            }
            // quarter points
            W::Expnd => {
                set.insert(AttrKey::Kerning, AttrValue::Int(param.unwrap_or(0) * 5));
            }
            W::ExpndTw => {
                set.insert(AttrKey::Kerning, int(0));
            }
            W::Lang => {
                set.insert(AttrKey::Language, int(1033));
            }
            W::Cs | W::S => return AttrEffect::StyleRef(style_id(param)),

            W::Pard => {
                reset_keys(AttrKey::PARAGRAPH_FORMAT, set, pool);
                self.reset();
                return AttrEffect::ResetStyle;
            }
            W::Ql => {
                set.insert(AttrKey::Adjust, AttrValue::Adjust(Adjust::Left));
            }
            W::Qr => {
                set.insert(AttrKey::Adjust, AttrValue::Adjust(Adjust::Right));
            }
            W::Qc => {
                set.insert(AttrKey::Adjust, AttrValue::Adjust(Adjust::Center));
            }
            W::Qj => {
                set.insert(AttrKey::Adjust, AttrValue::Adjust(Adjust::Justify));
            }
            W::Li => {
                set.insert(AttrKey::LeftIndent, int(0));
            }
            W::Ri => {
                set.insert(AttrKey::RightIndent, int(0));
            }
            W::Fi => {
                set.insert(AttrKey::FirstLineIndent, int(0));
            }
            W::Sb => {
                set.insert(AttrKey::SpaceBefore, int(0));
            }
            W::Sa => {
                set.insert(AttrKey::SpaceAfter, int(0));
            }
            W::Sl => {
                set.insert(AttrKey::LineSpacing, int(0));
            }
            W::Keep => {
                set.insert(AttrKey::KeepTogether, AttrValue::Bool(toggle(param)));
            }
            W::KeepN => {
                set.insert(AttrKey::KeepWithNext, AttrValue::Bool(toggle(param)));
            }
            W::OutlineLevel => {
                set.insert(AttrKey::OutlineLevel, int(0));
            }
            W::RtlPar => {
                set.insert(AttrKey::Direction, AttrValue::Direction(Direction::RightToLeft));
            }
            W::LtrPar => {
                set.insert(AttrKey::Direction, AttrValue::Direction(Direction::LeftToRight));
            }
            W::PgBrk => {
                set.insert(AttrKey::PageBreakBefore, AttrValue::Bool(toggle(param)));
            }
            W::PgDscNo => {
                set.insert(AttrKey::PageDescriptor, int(0));
            }

            W::Box => self.select_sides(SIDE_ALL, set),
            W::BrdrT => self.select_sides(SIDE_TOP, set),
            W::BrdrB => self.select_sides(SIDE_BOTTOM, set),
            W::BrdrL => self.select_sides(SIDE_LEFT, set),
            W::BrdrR => self.select_sides(SIDE_RIGHT, set),
            W::BrdrS => self.edit_lines(set, |line| line.style = BorderStyle::Single),
            W::BrdrTh => self.edit_lines(set, |line| line.style = BorderStyle::Thick),
            W::BrdrDb => self.edit_lines(set, |line| line.style = BorderStyle::Double),
            W::BrdrW => {
                let width = param.unwrap_or(0);
                self.edit_lines(set, |line| line.width = width);
            }
            W::BrdrCf => {
                let color = style_id(param);
                self.edit_lines(set, |line| line.color = color);
            }
            W::BrSp => {
                let spacing = param.unwrap_or(0);
                self.edit_lines(set, |line| line.spacing = spacing);
            }
            W::Shadow => {
                set.insert(AttrKey::BorderShadow, AttrValue::Bool(toggle(param)));
            }

            W::Tqr => self.tab_align = TabAlign::Right,
            W::Tqc => self.tab_align = TabAlign::Center,
            W::Tqdec => self.tab_align = TabAlign::Decimal,
            W::Tx => {
                let align = std::mem::take(&mut self.tab_align);
                insert_tab(set, param.unwrap_or(0), align);
            }
            W::Tb => {
                self.tab_align = TabAlign::Left;
                insert_tab(set, param.unwrap_or(0), TabAlign::Bar);
            }
            _ => {}
        }
        AttrEffect::None
    }

    fn select_sides(&mut self, sides: u8, set: &mut AttrSet) {
        self.border_sides = sides;
        let mut borders = current_borders(set);
        for (mask, slot) in side_slots(&mut borders) {
            if sides & mask != 0 && slot.is_none() {
                *slot = Some(BorderLine::default());
            }
        }
        set.insert(AttrKey::Borders, AttrValue::Borders(borders));
    }

    fn edit_lines(&mut self, set: &mut AttrSet, mut edit: impl FnMut(&mut BorderLine)) {
        if self.border_sides == 0 {
            return;
        }
        let mut borders = current_borders(set);
        for (mask, slot) in side_slots(&mut borders) {
            if self.border_sides & mask != 0 {
                edit(slot.get_or_insert_with(BorderLine::default));
            }
        }
        set.insert(AttrKey::Borders, AttrValue::Borders(borders));
    }
}

fn reset_keys(keys: &[AttrKey], set: &mut AttrSet, pool: &AttrPool) {
    for &key in keys {
        match pool.default_item(key) {
            Some(value) => {
                set.insert(key, value.clone());
            }
            None => {
                set.remove(key);
            }
        }
    }
}

fn current_borders(set: &AttrSet) -> Borders {
    match set.get(AttrKey::Borders) {
        Some(AttrValue::Borders(borders)) => *borders,
        _ => Borders::default(),
    }
}

fn side_slots(borders: &mut Borders) -> [(u8, &mut Option<BorderLine>); 4] {
    [
        (SIDE_TOP, &mut borders.top),
        (SIDE_BOTTOM, &mut borders.bottom),
        (SIDE_LEFT, &mut borders.left),
        (SIDE_RIGHT, &mut borders.right),
    ]
}

fn insert_tab(set: &mut AttrSet, position: i32, align: TabAlign) {
    let mut stops = match set.get(AttrKey::TabStops) {
        Some(AttrValue::Tabs(stops)) => stops.clone(),
        _ => TabStops::default(),
    };
    stops.insert(TabStop { position, align });
    set.insert(AttrKey::TabStops, AttrValue::Tabs(stops));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(words: &[(ControlWord, Option<i32>)]) -> (AttrSet, Vec<AttrEffect>) {
        let pool = AttrPool::new();
        let mut reader = AttrReader::default();
        let mut set = AttrSet::new();
        let effects = words
            .iter()
            .map(|(word, param)| reader.apply(*word, *param, &mut set, &pool))
            .collect();
        (set, effects)
    }

    #[test]
    fn toggles_honour_zero_parameter() {
        let (set, _) = read(&[
            (ControlWord::Bold, None),
            (ControlWord::Italic, Some(1)),
            (ControlWord::Ul, Some(0)),
        ]);
        assert_eq!(set.to_string(), "bold=true italic=true underline=none");
    }

    #[test]
    fn plain_resets_character_keys_to_defaults() {
        let (set, _) = read(&[
            (ControlWord::Bold, None),
            (ControlWord::Fs, Some(32)),
            (ControlWord::Li, Some(720)),
            (ControlWord::Plain, None),
        ]);
        assert_eq!(set.get(AttrKey::Weight), Some(&AttrValue::Bool(false)));
        assert_eq!(set.get(AttrKey::FontHeight), Some(&AttrValue::Int(24)));
        assert_eq!(set.get(AttrKey::LeftIndent), Some(&AttrValue::Int(720)));
    }

    #[test]
    fn pard_resets_paragraph_keys_and_style() {
        let (set, effects) = read(&[
            (ControlWord::Qc, None),
            (ControlWord::OutlineLevel, Some(2)),
            (ControlWord::Bold, None),
            (ControlWord::Pard, None),
        ]);
        assert_eq!(set.get(AttrKey::Adjust), Some(&AttrValue::Adjust(Adjust::Left)));
        assert_eq!(set.get(AttrKey::OutlineLevel), None);
        assert_eq!(set.get(AttrKey::Weight), Some(&AttrValue::Bool(true)));
        assert_eq!(effects.last(), Some(&AttrEffect::ResetStyle));
    }

    #[test]
    fn tab_definitions_accumulate() {
        let (set, _) = read(&[
            (ControlWord::Tx, Some(720)),
            (ControlWord::Tqr, None),
            (ControlWord::Tx, Some(2880)),
            (ControlWord::Tb, Some(1440)),
            (ControlWord::Tx, Some(720)),
        ]);
        assert_eq!(set.to_string(), "tabs=[720l,1440b,2880r]");
    }

    #[test]
    fn border_words_edit_selected_sides() {
        let (set, _) = read(&[
            (ControlWord::BrdrT, None),
            (ControlWord::BrdrDb, None),
            (ControlWord::BrdrW, Some(15)),
            (ControlWord::BrdrB, None),
            (ControlWord::BrdrCf, Some(3)),
        ]);
        assert_eq!(
            set.to_string(),
            "borders=[t:double/15/0,b:single/0/3]"
        );
    }

    #[test]
    fn style_words_report_references() {
        let (set, effects) = read(&[(ControlWord::S, Some(4)), (ControlWord::Cs, Some(-2))]);
        assert!(set.is_empty());
        assert_eq!(effects, vec![AttrEffect::StyleRef(4), AttrEffect::StyleRef(0)]);
    }
}
