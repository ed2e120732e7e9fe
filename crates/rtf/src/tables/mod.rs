//! Document tables read from the header: colors, fonts and styles.
//!
//! Fonts and styles are keyed by their declared id and re-declaring an id
//! replaces the earlier record. Colors are positional.

mod color;
mod font;
mod style;

pub use color::{ColorRecord, ColorTable};
pub use font::{FontFamily, FontPitch, FontRecord, FontTable};
pub use style::{StyleRecord, StyleTable};
