//! Проверка формата штрих-кода розничного товара.
//!
//! Принимаются только строки из цифр длиной 8, 12, 13 или 14
//! (EAN-8, UPC-A, EAN-13, GTIN-14). Контрольная цифра здесь НЕ проверяется:
//! `Barcode::check_digit_ok` существует только для диагностики.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Допустимые длины.
pub const VALID_LENGTHS: [usize; 4] = [8, 12, 13, 14];

/// Похож ли текст на штрих-код товара.
pub fn is_valid_barcode(text: &str) -> bool {
    !text.is_empty()
        && text.bytes().all(|c| c.is_ascii_digit())
        && VALID_LENGTHS.contains(&text.len())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a retail barcode: {0:?}")]
pub struct InvalidBarcode(pub String);

/// Проверенный штрих-код: только цифры, длина из `VALID_LENGTHS`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Barcode(String);

impl Barcode {
    pub fn parse(text: &str) -> Result<Self, InvalidBarcode> {
        if is_valid_barcode(text) {
            Ok(Self(text.to_owned()))
        } else {
            Err(InvalidBarcode(text.to_owned()))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Совпадает ли последняя цифра с контрольной суммой GS1.
    pub fn check_digit_ok(&self) -> bool {
        let digits: Vec<u8> = self.0.bytes().map(|c| c - b'0').collect();
        let (payload, check) = digits.split_at(digits.len() - 1);
        gs1_check_digit(payload) == check[0]
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Barcode {
    type Error = InvalidBarcode;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid_barcode(&s) {
            Ok(Self(s))
        } else {
            Err(InvalidBarcode(s))
        }
    }
}

impl From<Barcode> for String {
    fn from(b: Barcode) -> Self {
        b.0
    }
}

/// Контрольная цифра GS1 для цифр без неё: веса 3,1,3,… начиная с правой.
pub fn gs1_check_digit(payload: &[u8]) -> u8 {
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}
