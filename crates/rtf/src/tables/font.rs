use std::collections::BTreeMap;
use std::fmt;

use crate::charset::TextEncoding;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontFamily {
    #[default]
    DontKnow,
    Roman,
    Swiss,
    Modern,
    Script,
    Decorative,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontPitch {
    #[default]
    DontKnow,
    Fixed,
    Variable,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontRecord {
    /// Primary name, or `primary;alternate` when an alternate was declared.
    pub name: String,
    pub family: FontFamily,
    /// `None` means text in this font uses the document code page.
    pub encoding: Option<TextEncoding>,
    pub pitch: FontPitch,
}

impl FontRecord {
    pub fn primary_name(&self) -> &str {
        self.name.split(';').next().unwrap_or_default()
    }

    pub fn alternate_name(&self) -> Option<&str> {
        self.name.split_once(';').map(|(_, alt)| alt)
    }
}

impl fmt::Display for FontRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} {:?}", self.name, self.family, self.pitch)?;
        if let Some(encoding) = self.encoding {
            write!(f, " {}", encoding.name())?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontTable {
    entries: BTreeMap<u16, FontRecord>,
}

impl FontTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any record already declared under `id`.
    pub fn insert(&mut self, id: u16, font: FontRecord) {
        self.entries.insert(id, font);
    }

    pub fn get(&self, id: u16) -> Option<&FontRecord> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &FontRecord)> {
        self.entries.iter().map(|(id, font)| (*id, font))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclared_id_keeps_newest() {
        let mut table = FontTable::new();
        table.insert(
            3,
            FontRecord {
                name: "Old".to_string(),
                ..FontRecord::default()
            },
        );
        table.insert(
            3,
            FontRecord {
                name: "New;Alt".to_string(),
                family: FontFamily::Swiss,
                ..FontRecord::default()
            },
        );
        assert_eq!(table.len(), 1);
        let font = table.get(3).map(|f| (f.primary_name(), f.alternate_name(), f.family));
        assert_eq!(font, Some(("New", Some("Alt"), FontFamily::Swiss)));
    }
}
