//! Каскад предобработки: варианты сетки, которые пробуются по очереди,
//! пока детектор ничего не нашёл на оригинале.
//!
//! Порядок фиксирован, от дешёвого к дорогому:
//! 1. серый;
//! 2. глобальный порог по середине 8-битного диапазона (128);
//! 3. адаптивный порог: гауссово среднее окна 11×11 минус 2.
//!
//! `Cascade` — ленивый итератор: следующий вариант строится только когда
//! его попросили, так что после первого успеха остальные не вычисляются.

use std::borrow::Cow;

use crate::core::PixelGrid;

/// Порог глобальной бинаризации: середина диапазона яркостей.
pub const GLOBAL_THRESHOLD: u8 = 128;
/// Размер окна адаптивного порога (нечётный).
pub const ADAPTIVE_BLOCK: usize = 11;
/// Константа, вычитаемая из локального среднего.
pub const ADAPTIVE_C: f32 = 2.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Grayscale,
    GlobalThreshold,
    AdaptiveThreshold,
}

impl VariantKind {
    /// Все варианты в порядке применения.
    pub const ORDER: [VariantKind; 3] = [
        VariantKind::Grayscale,
        VariantKind::GlobalThreshold,
        VariantKind::AdaptiveThreshold,
    ];
}

#[derive(Clone, Debug)]
pub struct Variant {
    pub kind: VariantKind,
    pub grid: PixelGrid,
}

/// Ленивый каскад над одной исходной сеткой.
///
/// Серый вариант вычисляется один раз и переиспользуется порогами.
pub struct Cascade<'a> {
    source: &'a PixelGrid,
    gray: Option<PixelGrid>,
    next: usize,
}

impl<'a> Cascade<'a> {
    pub fn new(source: &'a PixelGrid) -> Self {
        // вырожденная сетка: ни одного варианта, а не частичный набор
        let next = if source.is_degenerate() {
            VariantKind::ORDER.len()
        } else {
            0
        };
        Self {
            source,
            gray: None,
            next,
        }
    }

    fn gray(&mut self) -> &PixelGrid {
        let source = self.source;
        self.gray.get_or_insert_with(|| grayscale(source))
    }
}

impl Iterator for Cascade<'_> {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        let kind = *VariantKind::ORDER.get(self.next)?;
        self.next += 1;
        let grid = match kind {
            VariantKind::Grayscale => self.gray().clone(),
            VariantKind::GlobalThreshold => threshold_global(self.gray(), GLOBAL_THRESHOLD),
            VariantKind::AdaptiveThreshold => threshold_adaptive(self.gray()),
        };
        Some(Variant { kind, grid })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = VariantKind::ORDER.len() - self.next;
        (left, Some(left))
    }
}

/// Все варианты сразу. Для вырожденной сетки — пустой список.
pub fn variants(grid: &PixelGrid) -> Vec<Variant> {
    Cascade::new(grid).collect()
}

/// Перевод в серый (для серой сетки — копия).
pub fn grayscale(grid: &PixelGrid) -> PixelGrid {
    grid.to_luma()
}

/// Серая сетка без копии, цветная переводится в серый.
fn luma_view(grid: &PixelGrid) -> Cow<'_, PixelGrid> {
    if grid.is_luma() {
        Cow::Borrowed(grid)
    } else {
        Cow::Owned(grid.to_luma())
    }
}

/// Бинаризация по фиксированному порогу: `v > t` → 255, иначе 0.
/// Цветная сетка сначала переводится в серый.
pub fn threshold_global(grid: &PixelGrid, t: u8) -> PixelGrid {
    let gray = luma_view(grid);
    let data = gray
        .data()
        .iter()
        .map(|&v| if v > t { 255 } else { 0 })
        .collect();
    rebuild(&gray, data)
}

/// Адаптивная бинаризация: `v > гаусс_среднее(11×11) − 2` → 255, иначе 0.
/// Края — повтор крайнего пикселя. Цветная сетка сначала переводится в серый.
pub fn threshold_adaptive(grid: &PixelGrid) -> PixelGrid {
    let gray = luma_view(grid);
    let (w, h) = (gray.width(), gray.height());
    if w == 0 || h == 0 {
        return gray.into_owned();
    }
    let kernel = gaussian_kernel(ADAPTIVE_BLOCK);
    let r = ADAPTIVE_BLOCK / 2;
    let src = gray.data();

    // горизонтальный проход
    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &kw) in kernel.iter().enumerate() {
                let sx = (x + k).saturating_sub(r).min(w - 1);
                acc += kw * f32::from(row[sx]);
            }
            tmp[y * w + x] = acc;
        }
    }

    // вертикальный проход и сравнение
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut mean = 0f32;
            for (k, &kw) in kernel.iter().enumerate() {
                let sy = (y + k).saturating_sub(r).min(h - 1);
                mean += kw * tmp[sy * w + x];
            }
            let v = f32::from(src[y * w + x]);
            out[y * w + x] = if v > mean - ADAPTIVE_C { 255 } else { 0 };
        }
    }
    rebuild(&gray, out)
}

/// Нормированное гауссово ядро; σ берётся из размера окна так же,
/// как это принято для адаптивного порога: 0.3·((n−1)/2 − 1) + 0.8.
fn gaussian_kernel(n: usize) -> Vec<f32> {
    let sigma = 0.3 * ((n as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let c = (n / 2) as f32;
    let raw: Vec<f32> = (0..n)
        .map(|i| {
            let d = i as f32 - c;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

fn rebuild(like: &PixelGrid, data: Vec<u8>) -> PixelGrid {
    // размеры берём у исходной серой сетки, длина буфера совпадает
    PixelGrid::from_luma(like.width(), like.height(), data)
        .unwrap_or_else(|| like.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: usize, h: usize) -> PixelGrid {
        let data = (0..w * h).map(|i| ((i % w) * 255 / (w - 1)) as u8).collect();
        PixelGrid::from_luma(w, h, data).unwrap()
    }

    #[test]
    fn three_variants_in_fixed_order() {
        let v = variants(&gradient(16, 4));
        let kinds: Vec<_> = v.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, VariantKind::ORDER.to_vec());
        assert!(v.iter().all(|v| v.grid.is_luma()));
    }

    #[test]
    fn degenerate_grid_yields_nothing() {
        let empty = PixelGrid::from_luma(0, 5, Vec::new()).unwrap();
        assert!(variants(&empty).is_empty());
        assert_eq!(Cascade::new(&empty).size_hint(), (0, Some(0)));
    }

    #[test]
    fn global_threshold_splits_at_midpoint() {
        let g = PixelGrid::from_luma(4, 1, vec![0, 128, 129, 255]).unwrap();
        assert_eq!(threshold_global(&g, GLOBAL_THRESHOLD).data(), &[0, 0, 255, 255]);
    }

    #[test]
    fn adaptive_threshold_keeps_flat_regions_white() {
        let flat = PixelGrid::from_luma(20, 20, vec![90; 400]).unwrap();
        assert!(threshold_adaptive(&flat).data().iter().all(|&v| v == 255));
    }

    #[test]
    fn adaptive_threshold_finds_dark_line_under_shadow() {
        // тёмная полоса в столбце 10 на фоне, который темнеет слева направо
        let (w, h) = (24, 12);
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let bg = 220 - (x * 6) as u8;
                data[y * w + x] = if x == 10 { bg - 60 } else { bg };
            }
        }
        let g = PixelGrid::from_luma(w, h, data).unwrap();
        let out = threshold_adaptive(&g);
        for y in 0..h {
            assert_eq!(out.data()[y * w + 10], 0);
            assert_eq!(out.data()[y * w + 3], 255);
        }
    }

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let k = gaussian_kernel(ADAPTIVE_BLOCK);
        assert_eq!(k.len(), 11);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((k[0] - k[10]).abs() < 1e-7);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn colour_input_is_converted_before_thresholding() {
        let rgb = PixelGrid::new(2, 1, 3, vec![255, 255, 255, 0, 0, 0]).unwrap();
        let v = variants(&rgb);
        assert_eq!(v[0].grid.data(), &[255, 0]);
        assert_eq!(v[1].grid.data(), &[255, 0]);
    }

    #[test]
    fn thresholds_accept_colour_grids_directly() {
        // светлый и тёмный пиксель: 3 канала на пиксель, а не 3 пикселя
        let rgb = PixelGrid::new(2, 1, 3, vec![200, 210, 220, 10, 20, 30]).unwrap();
        let global = threshold_global(&rgb, GLOBAL_THRESHOLD);
        assert!(global.is_luma());
        assert_eq!((global.width(), global.height()), (2, 1));
        assert_eq!(global.data(), &[255, 0]);

        let flat = PixelGrid::new(16, 16, 3, vec![120; 16 * 16 * 3]).unwrap();
        let adaptive = threshold_adaptive(&flat);
        assert!(adaptive.is_luma());
        assert_eq!(adaptive.data().len(), 16 * 16);
        assert!(adaptive.data().iter().all(|&v| v == 255));
    }
}
