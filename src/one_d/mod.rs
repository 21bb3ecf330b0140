//! 1D-детектор: EAN-13/UPC-A и EAN-8 сканированием линий.
//!
//! Сетка → равномерно выбранные строки (при неудаче — столбцы) → яркости
//! вдоль линии → бинаризация (адаптивная, фоллбэк глобальная) → run'ы →
//! поиск символа в обоих направлениях чтения.

pub mod ean13;
pub mod ean8;
pub mod synth;

use std::collections::HashSet;

use serde::Deserialize;
use tracing::trace;

use crate::api::SymbolDetector;
use crate::binarize::{binarize_line, binarize_line_adaptive, Runs};
use crate::core::{DecodedSymbol, PixelGrid};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Сколько строк сканировать (равномерно по высоте).
    pub scan_rows: usize,
    /// Сканировать ли столбцы, если по строкам ничего не нашлось (код повёрнут на 90°).
    pub scan_columns: bool,
    /// Линии короче этого (в пикселях) не могут вместить даже EAN-8.
    pub min_modules: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            scan_rows: 32,
            scan_columns: true,
            min_modules: ean8::MODULES,
        }
    }
}

/// Детектор линейных кодов розничной торговли.
#[derive(Clone, Debug, Default)]
pub struct LinearDetector {
    opts: DecodeOptions,
}

impl LinearDetector {
    #[inline]
    pub fn new(opts: DecodeOptions) -> Self {
        Self { opts }
    }

    #[inline]
    pub fn options(&self) -> &DecodeOptions {
        &self.opts
    }
}

impl SymbolDetector for LinearDetector {
    fn detect(&self, grid: &PixelGrid) -> Vec<DecodedSymbol> {
        if grid.is_degenerate() {
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut buf = Vec::new();

        for y in sample_positions(grid.height(), self.opts.scan_rows) {
            let line = grid.luma_row_into(y, &mut buf);
            if let Some(sym) = decode_line(line, &self.opts) {
                trace!(row = y, text = %sym.text, "symbol on row");
                if seen.insert(sym.text.clone()) {
                    found.push(sym);
                }
            }
        }

        if found.is_empty() && self.opts.scan_columns {
            for x in sample_positions(grid.width(), self.opts.scan_rows) {
                let line = grid.luma_col_into(x, &mut buf);
                if let Some(sym) = decode_line(line, &self.opts) {
                    trace!(col = x, text = %sym.text, "symbol on column");
                    if seen.insert(sym.text.clone()) {
                        found.push(sym);
                    }
                }
            }
        }

        found
    }
}

/// Декодировать одну линию яркостей. Первый найденный символ или `None`.
pub fn decode_line(line: &[u8], opts: &DecodeOptions) -> Option<DecodedSymbol> {
    if line.len() < opts.min_modules {
        return None;
    }

    // адаптивно, затем глобально; глобальную считаем только при неудаче
    let adaptive = Runs::from_binary(&binarize_line_adaptive(line));
    if let Some(sym) = decode_runs(&adaptive) {
        return Some(sym);
    }
    let global = Runs::from_binary(&binarize_line(line));
    decode_runs(&global)
}

/// Поиск символа в run'ах линии: прямое и обратное чтение, сначала EAN-13.
pub fn decode_runs(runs: &Runs) -> Option<DecodedSymbol> {
    if runs.len() < ean8::RUNS + 2 {
        return None;
    }
    let read = |r: &Runs| ean13::decode(r).or_else(|| ean8::decode(r));
    read(runs).or_else(|| read(&runs.reversed()))
}

/// `count` позиций внутри `[0, len)`, равномерно, без самых краёв.
fn sample_positions(len: usize, count: usize) -> impl Iterator<Item = usize> {
    let count = count.max(1).min(len);
    (0..count).map(move |i| (i + 1) * len / (count + 1))
}

// --- общее для EAN-13 и EAN-8 -------------------------------------------

/// Ширины L-набора (space/bar/space/bar), сумма 7 модулей. R-набор совпадает
/// по ширинам, G — это L задом наперёд.
pub(crate) const L_PATTERNS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

pub(crate) const G_PATTERNS: [[u8; 4]; 10] = [
    [1, 1, 2, 3],
    [1, 2, 2, 2],
    [2, 2, 1, 2],
    [1, 1, 4, 1],
    [2, 3, 1, 1],
    [1, 3, 2, 1],
    [4, 1, 1, 1],
    [2, 1, 3, 1],
    [3, 1, 2, 1],
    [2, 1, 1, 3],
];

/// Предельное суммарное отклонение цифры от эталона (в модулях).
const MAX_DIGIT_DIST: f32 = 1.5;
/// Допуск для модулей guard-паттернов.
const GUARD_MIN: f32 = 0.4;
const GUARD_MAX: f32 = 1.8;
/// Минимальная тихая зона вокруг символа (в модулях).
const QUIET_MIN: f32 = 3.0;

/// Все run'ы guard-паттерна шириной примерно в один модуль.
pub(crate) fn guard_ok(widths: &[usize], module: f32) -> bool {
    widths.iter().all(|&w| {
        let m = w as f32 / module;
        (GUARD_MIN..=GUARD_MAX).contains(&m)
    })
}

/// Перед `start` и после `end` (не включительно) — светлые run'ы не уже тихой зоны.
pub(crate) fn quiet_ok(runs: &Runs, start: usize, end: usize, module: f32) -> bool {
    if start == 0 || end >= runs.len() {
        return false;
    }
    let min = QUIET_MIN * module;
    runs.lengths[start - 1] as f32 >= min && runs.lengths[end] as f32 >= min
}

/// Ближайшая цифра по таблице: ширины нормируются к 7 модулям самой цифры.
/// Возвращает (цифра, расстояние); `None`, если ничего достаточно близкого.
pub(crate) fn match_digit(widths: &[usize], table: &[[u8; 4]; 10]) -> Option<(u8, f32)> {
    let total: usize = widths.iter().sum();
    if total == 0 {
        return None;
    }
    let scale = 7.0 / total as f32;
    let mut best = (0u8, f32::MAX);
    for (digit, pat) in table.iter().enumerate() {
        let dist: f32 = widths
            .iter()
            .zip(pat)
            .map(|(&w, &p)| (w as f32 * scale - f32::from(p)).abs())
            .sum();
        if dist < best.1 {
            best = (digit as u8, dist);
        }
    }
    (best.1 <= MAX_DIGIT_DIST).then_some(best)
}

/// Цифра «правой» стороны (R-набор): должна быть ближе к L-ширинам, чем к G,
/// иначе это, скорее всего, символ, прочитанный задом наперёд.
pub(crate) fn match_plain_digit(widths: &[usize]) -> Option<u8> {
    let (digit, dist) = match_digit(widths, &L_PATTERNS)?;
    match match_digit(widths, &G_PATTERNS) {
        Some((_, g)) if g < dist => None,
        _ => Some(digit),
    }
}

pub(crate) fn digits_to_string(digits: &[u8]) -> String {
    digits.iter().map(|&d| char::from(b'0' + d)).collect()
}
