use std::collections::BTreeMap;

use crate::attr::AttrSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleRecord {
    pub name: String,
    pub based_on: Option<u16>,
    pub outline_level: Option<u8>,
    /// Full formatting of the style, seeded from the document defaults.
    pub attrs: AttrSet,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleTable {
    entries: BTreeMap<u16, StyleRecord>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any record already declared under `id`.
    pub fn insert(&mut self, id: u16, style: StyleRecord) {
        self.entries.insert(id, style);
    }

    pub fn get(&self, id: u16) -> Option<&StyleRecord> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &StyleRecord)> {
        self.entries.iter().map(|(id, style)| (*id, style))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
