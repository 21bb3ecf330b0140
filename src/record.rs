//! Записи инвентаря: нормализованная карточка продукта, сохранённая партия
//! и событие изменения количества.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validate::Barcode;

/// Имя-заглушка для продукта без названия в каталоге.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Каноническая карточка продукта (пищевая ценность на 100 г).
///
/// Отсутствующее значение — всегда `None`, никогда не пустая строка,
/// пустой список или ноль «по умолчанию». При сериализации такие поля
/// опускаются, чтобы слияние не затирало сохранённые данные пустотой.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFoodRecord {
    pub barcode: Barcode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugars: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<String>>,
    pub quantity: u32,
}

impl NormalizedFoodRecord {
    /// Перенести в `self` только присутствующие поля `other`.
    /// Штрих-код и количество не трогаются, имя-заглушка тоже не переносится.
    pub fn merge_present(&mut self, other: &NormalizedFoodRecord) {
        if other.name != UNKNOWN_PRODUCT {
            self.name.clone_from(&other.name);
        }
        merge(&mut self.brand, &other.brand);
        merge(&mut self.category, &other.category);
        merge(&mut self.calories, &other.calories);
        merge(&mut self.protein, &other.protein);
        merge(&mut self.fat, &other.fat);
        merge(&mut self.carbs, &other.carbs);
        merge(&mut self.fiber, &other.fiber);
        merge(&mut self.sugars, &other.sugars);
        merge(&mut self.sodium, &other.sodium);
        merge(&mut self.allergens, &other.allergens);
    }
}

fn merge<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

/// Сохранённая партия: карточка + идентификатор и время создания.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub food: NormalizedFoodRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl InventoryRecord {
    pub fn new(food: NormalizedFoodRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            food,
            expiry_date: None,
            location: None,
        }
    }
}

/// Вид изменения количества.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Added,
    Removed,
    Consumed,
    Expired,
}

impl EventKind {
    /// Увеличивает ли событие остаток.
    #[inline]
    pub fn is_increase(self) -> bool {
        matches!(self, EventKind::Added)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Added => "added",
            EventKind::Removed => "removed",
            EventKind::Consumed => "consumed",
            EventKind::Expired => "expired",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event kind {0:?} (expected added, removed, consumed or expired)")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "added" => Ok(EventKind::Added),
            "removed" => Ok(EventKind::Removed),
            "consumed" => Ok(EventKind::Consumed),
            "expired" => Ok(EventKind::Expired),
            _ => Err(UnknownEventKind(s.to_owned())),
        }
    }
}

/// Запись журнала количества.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantityEvent {
    pub id: Uuid,
    pub record_id: Uuid,
    pub quantity: u32,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}
