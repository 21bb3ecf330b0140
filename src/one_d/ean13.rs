//! Декодер EAN-13/UPC-A по run'ам одной линии.
//!
//! Алгоритм:
//! 1) Перебираем кандидатов на старт: каждый бар, за которым помещается 59 run'ов
//!    (3 старт + 6×4 левые + 5 центр + 6×4 правые + 3 стоп = 95 модулей).
//! 2) Ширину модуля берём из окна целиком, проверяем guard'ы и тихие зоны.
//! 3) Левую половину декодируем по L/G, правую — по R.
//! 4) Первую цифру выводим из маски чётности L/G, проверяем контрольную цифру.
//!
//! UPC-A — это EAN-13 с ведущим 0; такие коды отдаём 12 цифрами.

use crate::binarize::Runs;
use crate::core::{DecodedSymbol, Symbology};
use crate::one_d::{
    digits_to_string, guard_ok, match_digit, match_plain_digit, quiet_ok, G_PATTERNS, L_PATTERNS,
};
use crate::validate::gs1_check_digit;

/// Run'ов в символе.
pub const RUNS: usize = 59;
/// Модулей в символе (без тихих зон).
pub const MODULES: usize = 95;

/// Маски чётности шести левых цифр для первой цифры 0..9; true = G.
pub(crate) const PARITY_MASKS: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

/// Первый символ EAN-13/UPC-A в run'ах (в заданном направлении чтения).
pub fn decode(runs: &Runs) -> Option<DecodedSymbol> {
    if runs.len() < RUNS {
        return None;
    }
    (0..=runs.len() - RUNS)
        .filter(|&s| runs.is_bar(s))
        .find_map(|s| decode_at(runs, s))
}

fn decode_at(runs: &Runs, start: usize) -> Option<DecodedSymbol> {
    let w = &runs.lengths[start..start + RUNS];
    let module = w.iter().sum::<usize>() as f32 / MODULES as f32;

    if !guard_ok(&w[0..3], module) || !guard_ok(&w[27..32], module) || !guard_ok(&w[56..59], module)
    {
        return None;
    }
    if !quiet_ok(runs, start, start + RUNS, module) {
        return None;
    }

    let mut digits = [0u8; 13];
    let mut parity = [false; 6];

    for d in 0..6 {
        let at = 3 + 4 * d;
        let cell = &w[at..at + 4];
        let l = match_digit(cell, &L_PATTERNS);
        let g = match_digit(cell, &G_PATTERNS);
        let (digit, is_g) = match (l, g) {
            (Some((dl, el)), Some((dg, eg))) => {
                if el <= eg {
                    (dl, false)
                } else {
                    (dg, true)
                }
            }
            (Some((dl, _)), None) => (dl, false),
            (None, Some((dg, _))) => (dg, true),
            (None, None) => return None,
        };
        digits[1 + d] = digit;
        parity[d] = is_g;
    }

    for d in 0..6 {
        let at = 32 + 4 * d;
        digits[7 + d] = match_plain_digit(&w[at..at + 4])?;
    }

    digits[0] = first_digit(&parity)?;
    if gs1_check_digit(&digits[..12]) != digits[12] {
        return None;
    }

    let sym = if digits[0] == 0 {
        DecodedSymbol::new(Symbology::UpcA, digits_to_string(&digits[1..]))
    } else {
        DecodedSymbol::new(Symbology::Ean13, digits_to_string(&digits))
    };
    Some(sym)
}

fn first_digit(parity: &[bool; 6]) -> Option<u8> {
    PARITY_MASKS
        .iter()
        .position(|m| m == parity)
        .map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binarize::{binarize_line_adaptive, Runs};
    use crate::one_d::synth;

    fn runs_of(row: &[u8]) -> Runs {
        Runs::from_binary(&binarize_line_adaptive(row))
    }

    #[test]
    fn decodes_ideal_ean13() {
        let row = synth::ean13_row("4006381333931", 3).unwrap();
        let sym = decode(&runs_of(&row)).unwrap();
        assert_eq!(sym.symbology, Symbology::Ean13);
        assert_eq!(sym.text, "4006381333931");
    }

    #[test]
    fn leading_zero_is_reported_as_upca() {
        let row = synth::ean13_row("036000291452", 2).unwrap();
        let sym = decode(&runs_of(&row)).unwrap();
        assert_eq!(sym.symbology, Symbology::UpcA);
        assert_eq!(sym.text, "036000291452");
    }

    #[test]
    fn reversed_reading_is_not_misread() {
        let row = synth::ean13_row("5901234123457", 2).unwrap();
        let runs = runs_of(&row);
        assert!(decode(&runs.reversed()).is_none());
        // а обратно развёрнутая строка читается через reversed()
        let mut flipped = row.clone();
        flipped.reverse();
        let sym = decode(&runs_of(&flipped).reversed()).unwrap();
        assert_eq!(sym.text, "5901234123457");
    }

    #[test]
    fn bad_check_digit_is_rejected() {
        let row = synth::ean13_row("5901234123458", 2).unwrap();
        assert!(decode(&runs_of(&row)).is_none());
    }

    #[test]
    fn tolerates_uneven_module_widths() {
        // бары на пиксель толще, пробелы на пиксель тоньше — типичная «растекшаяся» печать
        let row = synth::ean13_row("5901234123457", 4).unwrap();
        let clean: Vec<bool> = row.iter().map(|&v| v < 128).collect();
        let mut bin = clean.clone();
        for i in 1..clean.len() {
            if clean[i - 1] && !clean[i] {
                bin[i] = true;
            }
        }
        let sym = decode(&Runs::from_binary(&bin)).unwrap();
        assert_eq!(sym.text, "5901234123457");
    }

    #[test]
    fn parity_masks_are_unique() {
        for (i, a) in PARITY_MASKS.iter().enumerate() {
            for b in &PARITY_MASKS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
