#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// пиксели, ширины run'ов и размеры картинок ходят между usize/u32/f32
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::many_single_char_names,
    clippy::similar_names
)]

// Распознавание
pub mod api;      // пайплайн «декодер → детектор → каскад», трейт SymbolDetector
pub mod core;     // PixelGrid, DecodedSymbol и пр.
pub mod decode;   // байты JPEG/PNG/GIF/BMP → PixelGrid
pub mod cascade;  // варианты предобработки (серый, глобальный и адаптивный порог)
pub mod binarize; // бинаризация линии и run'ы для 1D
pub mod one_d;    // EAN-13/UPC-A, EAN-8, синтез тестовых кодов

// Обогащение и учёт
pub mod validate;  // формат штрих-кода
pub mod catalog;   // OpenFoodFacts
pub mod normalize; // ответ каталога → NormalizedFoodRecord
pub mod record;    // карточки, партии, события
pub mod store;     // Store + MemoryStore
pub mod workflow;  // EnrichmentWorkflow → Outcome

pub mod config;
pub mod error;
pub mod prelude; // удобные re-export'ы

pub use crate::api::{Detection, Pipeline, Stage, SymbolDetector};
pub use crate::config::Config;
pub use crate::core::{DecodedSymbol, PixelGrid, Symbology};
pub use crate::one_d::{DecodeOptions, LinearDetector};
pub use crate::validate::{is_valid_barcode, Barcode};
pub use crate::workflow::{Action, EnrichmentWorkflow, Outcome};

/// One-shot: найти штрих-коды на изображении пайплайном по умолчанию.
#[inline]
pub fn detect(bytes: &[u8], format: &str) -> Vec<String> {
    Pipeline::new().detect(bytes, format)
}
