//! Синтез идеальных штрих-кодов: для тестов, бенчей и демо `scan_synthetic`.
//!
//! Строка пикселей: чёрный = 0, белый = 255, слева и справа тихая зона.
//! Контрольная цифра НЕ пересчитывается — так можно синтезировать и битые коды.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageResult};

use crate::core::PixelGrid;
use crate::one_d::ean13::PARITY_MASKS;
use crate::one_d::{G_PATTERNS, L_PATTERNS};

/// Тихая зона с каждой стороны, в модулях.
pub const QUIET_MODULES: u8 = 11;

/// EAN-13 (13 цифр) или UPC-A (12 цифр, кодируется как EAN-13 с ведущим 0).
pub fn ean13_row(code: &str, unit: usize) -> Option<Vec<u8>> {
    let ds = parse_digits(code)?;
    let digits: Vec<u8> = match ds.len() {
        13 => ds,
        12 => std::iter::once(0).chain(ds).collect(),
        _ => return None,
    };

    let mask = PARITY_MASKS[usize::from(digits[0])];
    let mut modules = vec![QUIET_MODULES, 1, 1, 1];
    for (i, &d) in digits[1..7].iter().enumerate() {
        let table = if mask[i] { &G_PATTERNS } else { &L_PATTERNS };
        modules.extend(table[usize::from(d)]);
    }
    modules.extend([1, 1, 1, 1, 1]);
    for &d in &digits[7..13] {
        modules.extend(L_PATTERNS[usize::from(d)]);
    }
    modules.extend([1, 1, 1, QUIET_MODULES]);

    Some(paint(&modules, unit))
}

/// EAN-8 (8 цифр).
pub fn ean8_row(code: &str, unit: usize) -> Option<Vec<u8>> {
    let digits = parse_digits(code)?;
    if digits.len() != 8 {
        return None;
    }
    let mut modules = vec![QUIET_MODULES, 1, 1, 1];
    for &d in &digits[..4] {
        modules.extend(L_PATTERNS[usize::from(d)]);
    }
    modules.extend([1, 1, 1, 1, 1]);
    for &d in &digits[4..] {
        modules.extend(L_PATTERNS[usize::from(d)]);
    }
    modules.extend([1, 1, 1, QUIET_MODULES]);

    Some(paint(&modules, unit))
}

/// Размножить строку на `height` строк: вертикальные полосы.
/// `None`, если размер картинки не помещается в `usize`.
pub fn render(row: &[u8], height: usize) -> Option<PixelGrid> {
    let len = row.len().checked_mul(height)?;
    let data = row.iter().copied().cycle().take(len).collect();
    PixelGrid::from_luma(row.len(), height, data)
}

/// Закодировать сетку в PNG (для тестов полного пайплайна).
pub fn encode_png(grid: &PixelGrid) -> ImageResult<Vec<u8>> {
    let color = if grid.is_luma() {
        ExtendedColorType::L8
    } else {
        ExtendedColorType::Rgb8
    };
    let mut out = Cursor::new(Vec::new());
    PngEncoder::new(&mut out).write_image(
        grid.data(),
        grid.width() as u32,
        grid.height() as u32,
        color,
    )?;
    Ok(out.into_inner())
}

fn parse_digits(code: &str) -> Option<Vec<u8>> {
    code.bytes()
        .map(|c| c.is_ascii_digit().then(|| c - b'0'))
        .collect()
}

/// Модули → пиксели, начиная с белого (тихая зона).
fn paint(modules: &[u8], unit: usize) -> Vec<u8> {
    let unit = unit.max(1);
    let mut pix = Vec::with_capacity(modules.iter().map(|&m| usize::from(m)).sum::<usize>() * unit);
    let mut black = false;
    for &m in modules {
        let val = if black { 0u8 } else { 255u8 };
        pix.extend(std::iter::repeat(val).take(usize::from(m) * unit));
        black = !black;
    }
    pix
}
