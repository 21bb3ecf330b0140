// src/api.rs
//
// Верхний уровень распознавания: трейт детектора и пайплайн
// «декодер → детектор на оригинале → каскад предобработки».

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cascade::{Cascade, VariantKind};
use crate::core::{DecodedSymbol, PixelGrid};
use crate::decode::decode;
use crate::one_d::{DecodeOptions, LinearDetector};

/// Поиск и декодирование символов на сетке.
///
/// Реализация не должна паниковать на испорченных данных: всё, что не
/// удалось прочитать, просто не попадает в результат.
pub trait SymbolDetector {
    fn detect(&self, grid: &PixelGrid) -> Vec<DecodedSymbol>;
}

impl<T: SymbolDetector + ?Sized> SymbolDetector for &T {
    #[inline]
    fn detect(&self, grid: &PixelGrid) -> Vec<DecodedSymbol> {
        (**self).detect(grid)
    }
}

impl<T: SymbolDetector + ?Sized> SymbolDetector for Box<T> {
    #[inline]
    fn detect(&self, grid: &PixelGrid) -> Vec<DecodedSymbol> {
        (**self).detect(grid)
    }
}

/// На какой стадии нашёлся символ.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Original,
    Variant(VariantKind),
}

/// Успешное распознавание: тексты в порядке детектора и стадия.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    pub stage: Stage,
    pub symbols: Vec<DecodedSymbol>,
}

impl Detection {
    pub fn texts(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.text.clone()).collect()
    }
}

/// Пайплайн распознавания с ранним выходом.
#[derive(Clone, Debug, Default)]
pub struct Pipeline<D = LinearDetector> {
    detector: D,
}

impl Pipeline<LinearDetector> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_options(opts: DecodeOptions) -> Self {
        Self::with_detector(LinearDetector::new(opts))
    }
}

impl<D: SymbolDetector> Pipeline<D> {
    #[inline]
    pub fn with_detector(detector: D) -> Self {
        Self { detector }
    }

    #[inline]
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// «Найди штрих-коды на этой картинке». Битые байты → пустой список.
    pub fn detect(&self, bytes: &[u8], format: &str) -> Vec<String> {
        let grid = match decode(bytes, format) {
            Ok(grid) => grid,
            Err(e) => {
                warn!(error = %e, format = %format, "image could not be decoded");
                return Vec::new();
            }
        };
        debug!(
            width = grid.width(),
            height = grid.height(),
            channels = grid.channels(),
            "image decoded"
        );

        match self.detect_grid(&grid) {
            Some(found) => {
                info!(stage = ?found.stage, barcodes = ?found.texts(), "barcodes detected");
                found.texts()
            }
            None => {
                warn!("no barcode detected in image");
                Vec::new()
            }
        }
    }

    /// То же на уже разобранной сетке: сначала оригинал, затем варианты
    /// каскада по порядку. Остальные варианты после успеха не строятся.
    pub fn detect_grid(&self, grid: &PixelGrid) -> Option<Detection> {
        let symbols = self.detector.detect(grid);
        if !symbols.is_empty() {
            return Some(Detection {
                stage: Stage::Original,
                symbols,
            });
        }

        for variant in Cascade::new(grid) {
            let symbols = self.detector.detect(&variant.grid);
            debug!(variant = ?variant.kind, found = symbols.len(), "cascade variant tried");
            if !symbols.is_empty() {
                return Some(Detection {
                    stage: Stage::Variant(variant.kind),
                    symbols,
                });
            }
        }
        None
    }
}
