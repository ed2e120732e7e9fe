//! Pool defaults: the value a key has when no scope sets it.

use std::collections::BTreeMap;

use super::{
    Adjust, AttrKey, AttrValue, Borders, CaseMap, Direction, ScriptPosition, Strike, TabStops,
    Underline,
};

#[derive(Clone, Debug)]
pub struct AttrPool {
    defaults: BTreeMap<AttrKey, AttrValue>,
}

impl Default for AttrPool {
    fn default() -> Self {
        Self::new()
    }
}

impl AttrPool {
    pub fn new() -> Self {
        let defaults = [
            (AttrKey::Weight, AttrValue::Bool(false)),
            (AttrKey::Posture, AttrValue::Bool(false)),
            (AttrKey::Underline, AttrValue::Underline(Underline::None)),
            (AttrKey::Strikeout, AttrValue::Strike(Strike::None)),
            (AttrKey::CaseMap, AttrValue::CaseMap(CaseMap::Normal)),
            (AttrKey::Contour, AttrValue::Bool(false)),
            (AttrKey::Shadowed, AttrValue::Bool(false)),
            (AttrKey::Hidden, AttrValue::Bool(false)),
            (AttrKey::Font, AttrValue::Int(0)),
            (AttrKey::FontHeight, AttrValue::Int(24)),
            (AttrKey::Color, AttrValue::Int(0)),
            (AttrKey::Highlight, AttrValue::Int(0)),
            (AttrKey::Escapement, AttrValue::Script(ScriptPosition::Baseline)),
            (AttrKey::Raise, AttrValue::Int(0)),
            (AttrKey::Kerning, AttrValue::Int(0)),
            (AttrKey::Language, AttrValue::Int(1033)),
            (AttrKey::Adjust, AttrValue::Adjust(Adjust::Left)),
            (AttrKey::LeftIndent, AttrValue::Int(0)),
            (AttrKey::RightIndent, AttrValue::Int(0)),
            (AttrKey::FirstLineIndent, AttrValue::Int(0)),
            (AttrKey::SpaceBefore, AttrValue::Int(0)),
            (AttrKey::SpaceAfter, AttrValue::Int(0)),
            (AttrKey::LineSpacing, AttrValue::Int(0)),
            (AttrKey::KeepTogether, AttrValue::Bool(false)),
            (AttrKey::KeepWithNext, AttrValue::Bool(false)),
            (AttrKey::Direction, AttrValue::Direction(Direction::LeftToRight)),
            (AttrKey::TabStops, AttrValue::Tabs(TabStops::default())),
            (AttrKey::Borders, AttrValue::Borders(Borders::default())),
            (AttrKey::BorderShadow, AttrValue::Bool(false)),
            (AttrKey::PageBreakBefore, AttrValue::Bool(false)),
            (AttrKey::ScriptSpace, AttrValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        Self { defaults }
    }

    pub fn default_item(&self, key: AttrKey) -> Option<&AttrValue> {
        self.defaults.get(&key)
    }

    pub fn set_pool_default(&mut self, key: AttrKey, value: AttrValue) {
        self.defaults.insert(key, value);
    }

    pub fn is_default(&self, key: AttrKey, value: &AttrValue) -> bool {
        self.defaults.get(&key) == Some(value)
    }
}
