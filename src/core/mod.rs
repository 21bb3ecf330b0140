//! Общие типы: сетка пикселей, распознанный символ, симвология.

pub mod types;

pub use types::{luma, DecodedSymbol, PixelGrid, Symbology};
