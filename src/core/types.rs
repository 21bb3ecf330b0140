// src/core/types.rs
//
// Общие типы, независимые от конкретных декодеров и стадий пайплайна.

use std::fmt;

/// Сетка пикселей: построчно (row-major), `channels` байт на пиксель.
///
/// Поддерживаются 1 канал (яркость) и 3 канала (RGB). Сетка неизменяема:
/// каждое преобразование строит новую, исходная не трогается.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl PixelGrid {
    /// Собрать сетку из готового буфера. `None`, если длина буфера не сходится
    /// с размерами или число каналов не 1 и не 3.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Option<Self> {
        if channels != 1 && channels != 3 {
            return None;
        }
        let expected = width.checked_mul(height)?.checked_mul(channels)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Одноканальная сетка (яркость).
    #[inline]
    pub fn from_luma(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        Self::new(width, height, 1, data)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Пустая сетка (0×N или N×0): ни одно преобразование к ней не применимо.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn is_luma(&self) -> bool {
        self.channels == 1
    }

    /// Сырые байты строки `y` (с учётом каналов).
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.channels;
        let start = y * stride;
        &self.data[start..start + stride]
    }

    /// Яркость пикселя `(x, y)`.
    #[inline]
    pub fn luma_at(&self, x: usize, y: usize) -> u8 {
        let i = (y * self.width + x) * self.channels;
        if self.channels == 1 {
            self.data[i]
        } else {
            luma(self.data[i], self.data[i + 1], self.data[i + 2])
        }
    }

    /// Строка `y` в яркостях — в буфер `out`, без лишних аллокаций.
    pub fn luma_row_into<'b>(&self, y: usize, out: &'b mut Vec<u8>) -> &'b [u8] {
        out.clear();
        if self.channels == 1 {
            out.extend_from_slice(self.row(y));
        } else {
            out.extend(
                self.row(y)
                    .chunks_exact(3)
                    .map(|px| luma(px[0], px[1], px[2])),
            );
        }
        &out[..]
    }

    /// Столбец `x` в яркостях — в буфер `out`.
    pub fn luma_col_into<'b>(&self, x: usize, out: &'b mut Vec<u8>) -> &'b [u8] {
        out.clear();
        out.reserve(self.height);
        for y in 0..self.height {
            out.push(self.luma_at(x, y));
        }
        &out[..]
    }

    /// Копия в одноканальном виде. Для яркостной сетки — просто клон.
    pub fn to_luma(&self) -> PixelGrid {
        if self.channels == 1 {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        Self {
            data,
            width: self.width,
            height: self.height,
            channels: 1,
        }
    }
}

/// Яркость по весам ITU-R BT.601 (0.299 R + 0.587 G + 0.114 B), с округлением.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    // максимум 255 * 1000, после деления помещается в u8
    ((y + 500) / 1000) as u8
}

/// Тип распознанного символа.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbology {
    Ean13,
    UpcA,
    Ean8,
    Unknown,
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Symbology::Ean13 => "EAN-13",
            Symbology::UpcA => "UPC-A",
            Symbology::Ean8 => "EAN-8",
            Symbology::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Результат детектора: текст символа и его симвология.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DecodedSymbol {
    pub symbology: Symbology,
    pub text: String,
}

impl DecodedSymbol {
    #[inline]
    pub fn new(symbology: Symbology, text: impl Into<String>) -> Self {
        Self {
            symbology,
            text: text.into(),
        }
    }
}
