//! Декодер EAN-8 по run'ам одной линии.
//!
//! Структура та же, что у EAN-13, но короче: 3 старт + 4×4 левые (только L)
//! + 5 центр + 4×4 правые (R) + 3 стоп = 43 run'а, 67 модулей.
//! Маски чётности нет, поэтому обратное чтение отсекается сравнением L и G.

use crate::binarize::Runs;
use crate::core::{DecodedSymbol, Symbology};
use crate::one_d::{digits_to_string, guard_ok, match_plain_digit, quiet_ok};
use crate::validate::gs1_check_digit;

pub const RUNS: usize = 43;
pub const MODULES: usize = 67;

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

    if !guard_ok(&w[0..3], module) || !guard_ok(&w[19..24], module) || !guard_ok(&w[40..43], module)
    {
        return None;
    }
    if !quiet_ok(runs, start, start + RUNS, module) {
        return None;
    }

    let mut digits = [0u8; 8];
    for d in 0..4 {
        let left = 3 + 4 * d;
        let right = 24 + 4 * d;
        digits[d] = match_plain_digit(&w[left..left + 4])?;
        digits[4 + d] = match_plain_digit(&w[right..right + 4])?;
    }

    if gs1_check_digit(&digits[..7]) != digits[7] {
        return None;
    }
    Some(DecodedSymbol::new(Symbology::Ean8, digits_to_string(&digits)))
}
