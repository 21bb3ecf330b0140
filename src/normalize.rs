//! Нормализация ответа каталога в каноническую карточку продукта.
//!
//! Правила:
//! - имя: `product_name` без пробелов по краям, иначе "Unknown Product";
//! - бренд: `brands`; категория: первый сегмент `categories` до запятой;
//! - нутриенты `*_100g`: отсутствие, ноль, не-число, отрицательное → нет значения
//!   (ноль в каталоге означает «не указано»); калории округляются до целого
//!   (половины к чётному), остальное до сотых по точному значению числа;
//! - аллергены: список через запятую, пустые элементы выбрасываются;
//! - количество: 1 (отсканирована одна единица).

use serde_json::Value;

use crate::catalog::ProductPayload;
use crate::record::{NormalizedFoodRecord, UNKNOWN_PRODUCT};
use crate::validate::Barcode;

pub const CALORIES_KEY: &str = "energy-kcal_100g";
pub const PROTEIN_KEY: &str = "proteins_100g";
pub const FAT_KEY: &str = "fat_100g";
pub const CARBS_KEY: &str = "carbohydrates_100g";
pub const FIBER_KEY: &str = "fiber_100g";
pub const SUGARS_KEY: &str = "sugars_100g";
pub const SODIUM_KEY: &str = "sodium_100g";

pub fn normalize(barcode: &Barcode, payload: &ProductPayload) -> NormalizedFoodRecord {
    let name = text(payload.get("product_name")).unwrap_or_else(|| UNKNOWN_PRODUCT.to_owned());
    let brand = text(payload.get("brands"));
    let category = text(payload.get("categories"))
        .and_then(|c| c.split(',').next().map(str::trim).map(str::to_owned))
        .filter(|c| !c.is_empty());

    let calories = nutrient(payload, CALORIES_KEY).map(|v| v.round_ties_even() as u32);

    NormalizedFoodRecord {
        barcode: barcode.clone(),
        name,
        brand,
        category,
        calories,
        protein: nutrient(payload, PROTEIN_KEY).map(round2),
        fat: nutrient(payload, FAT_KEY).map(round2),
        carbs: nutrient(payload, CARBS_KEY).map(round2),
        fiber: nutrient(payload, FIBER_KEY).map(round2),
        sugars: nutrient(payload, SUGARS_KEY).map(round2),
        sodium: nutrient(payload, SODIUM_KEY).map(round2),
        allergens: allergens(payload.get("allergens")),
        quantity: 1,
    }
}

/// Строка без пробелов по краям; пустая или не строка → `None`.
fn text(v: Option<&Value>) -> Option<String> {
    let s = v?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

/// Значение нутриента, если оно «указано»: конечное положительное число
/// (или строка с таким числом).
fn nutrient(payload: &ProductPayload, key: &str) -> Option<f64> {
    let v = match payload.nutriment(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (v.is_finite() && v > 0.0).then_some(v)
}

/// До сотых по точному двоичному значению числа, а не по `v * 100.0`
/// (0.015 хранится как 0.01499…, и ответ должен быть 0.01).
fn round2(v: f64) -> f64 {
    format!("{v:.2}").parse().unwrap_or(v)
}

fn allergens(v: Option<&Value>) -> Option<Vec<String>> {
    let list: Vec<String> = v?
        .as_str()?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    (!list.is_empty()).then_some(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> ProductPayload {
        ProductPayload::from_value(v).unwrap()
    }

    fn code() -> Barcode {
        Barcode::parse("3017620422003").unwrap()
    }

    #[test]
    fn full_product_is_mapped() {
        let p = payload(json!({
            "product_name": "  Nutella ",
            "brands": "Ferrero",
            "categories": "Spreads, Sweet spreads, Hazelnut spreads",
            "allergens": "en:milk, en:nuts,en:soybeans",
            "nutriments": {
                "energy-kcal_100g": 539,
                "proteins_100g": 6.3,
                "fat_100g": 30.9,
                "carbohydrates_100g": 57.5,
                "fiber_100g": 0,
                "sugars_100g": 56.3,
                "sodium_100g": 0.0428
            }
        }));
        let r = normalize(&code(), &p);
        assert_eq!(r.name, "Nutella");
        assert_eq!(r.brand.as_deref(), Some("Ferrero"));
        assert_eq!(r.category.as_deref(), Some("Spreads"));
        assert_eq!(r.calories, Some(539));
        assert_eq!(r.protein, Some(6.3));
        assert_eq!(r.fat, Some(30.9));
        assert_eq!(r.carbs, Some(57.5));
        assert_eq!(r.fiber, None);
        assert_eq!(r.sugars, Some(56.3));
        assert_eq!(r.sodium, Some(0.04));
        assert_eq!(
            r.allergens,
            Some(vec!["en:milk".to_owned(), "en:nuts".to_owned(), "en:soybeans".to_owned()])
        );
        assert_eq!(r.quantity, 1);
    }

    #[test]
    fn zero_protein_is_absent() {
        let r = normalize(&code(), &payload(json!({"nutriments": {"proteins_100g": 0}})));
        assert_eq!(r.protein, None);
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("protein").is_none());
    }

    #[test]
    fn allergens_are_trimmed_in_order() {
        let r = normalize(&code(), &payload(json!({"allergens": "milk, soy"})));
        assert_eq!(r.allergens, Some(vec!["milk".to_owned(), "soy".to_owned()]));

        let r = normalize(&code(), &payload(json!({"allergens": " , ,"})));
        assert_eq!(r.allergens, None);
        let r = normalize(&code(), &payload(json!({"allergens": ""})));
        assert_eq!(r.allergens, None);
    }

    #[test]
    fn empty_product_gets_placeholder_name_only() {
        let r = normalize(&code(), &payload(json!({"product_name": "   ", "brands": "", "categories": " ,Snacks"})));
        assert_eq!(r.name, UNKNOWN_PRODUCT);
        assert_eq!(r.brand, None);
        assert_eq!(r.category, None);
        let json = serde_json::to_value(&r).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3, "{keys:?}");
    }

    #[test]
    fn wrongly_typed_fields_are_dropped() {
        let p = payload(json!({
            "product_name": 42,
            "brands": ["a", "b"],
            "allergens": {"milk": true},
            "nutriments": {
                "energy-kcal_100g": "250.5",
                "proteins_100g": "lots",
                "fat_100g": -3,
                "sugars_100g": true,
                "sodium_100g": "NaN"
            }
        }));
        let r = normalize(&code(), &p);
        assert_eq!(r.name, UNKNOWN_PRODUCT);
        assert_eq!(r.brand, None);
        assert_eq!(r.allergens, None);
        assert_eq!(r.calories, Some(250));
        assert_eq!(r.protein, None);
        assert_eq!(r.fat, None);
        assert_eq!(r.sugars, None);
        assert_eq!(r.sodium, None);
    }

    #[test]
    fn nutriments_not_an_object_is_tolerated() {
        let r = normalize(&code(), &payload(json!({"nutriments": [1, 2, 3]})));
        assert_eq!(r.calories, None);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(2.5), 2.5);
        let r = normalize(&code(), &payload(json!({"nutriments": {"energy-kcal_100g": 52.5}})));
        assert_eq!(r.calories, Some(52));
        let r = normalize(&code(), &payload(json!({"nutriments": {"energy-kcal_100g": 53.5}})));
        assert_eq!(r.calories, Some(54));
    }

    #[test]
    fn hundredths_follow_the_exact_binary_value() {
        let cases = [
            (0.025, 0.03),
            (0.015, 0.01),
            (0.075, 0.07),
            (0.065, 0.07),
            (0.155, 0.15),
        ];
        for (raw, expected) in cases {
            assert_eq!(round2(raw), expected, "{raw}");
            let r = normalize(&code(), &payload(json!({"nutriments": {"sodium_100g": raw}})));
            assert_eq!(r.sodium, Some(expected), "{raw}");
        }
    }

    #[test]
    fn tiny_values_are_kept_after_rounding() {
        // значение «указано» (не ноль), хотя после округления и станет нулём
        let r = normalize(&code(), &payload(json!({"nutriments": {"fiber_100g": 0.001}})));
        assert_eq!(r.fiber, Some(0.0));
    }

    #[test]
    fn normalisation_is_deterministic() {
        let p = payload(json!({
            "product_name": "Oat drink",
            "allergens": "oats",
            "nutriments": {"energy-kcal_100g": 46, "fat_100g": 1.5}
        }));
        let a = serde_json::to_vec(&normalize(&code(), &p)).unwrap();
        let b = serde_json::to_vec(&normalize(&code(), &p)).unwrap();
        assert_eq!(a, b);
    }
}
