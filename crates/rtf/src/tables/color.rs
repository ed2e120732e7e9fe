use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRecord {
    /// Inherit the renderer's automatic color.
    Auto,
    Rgb { red: u8, green: u8, blue: u8 },
}

impl fmt::Display for ColorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorRecord::Auto => f.write_str("auto"),
            ColorRecord::Rgb { red, green, blue } => {
                write!(f, "#{red:02x}{green:02x}{blue:02x}")
            }
        }
    }
}

/// Append-only; the index of a record is its id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<ColorRecord>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, color: ColorRecord) {
        self.entries.push(color);
    }

    pub fn get(&self, index: usize) -> Option<ColorRecord> {
        self.entries.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorRecord> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
