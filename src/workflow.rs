//! Сценарий «фото → штрих-код → карточка продукта → (сохранение)».
//!
//! Ни один сбой не выходит наружу паникой или `Err`: всё превращается в
//! вариант `Outcome`.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{Pipeline, SymbolDetector};
use crate::catalog::ProductCatalog;
use crate::normalize::normalize;
use crate::one_d::LinearDetector;
use crate::record::{InventoryRecord, NormalizedFoodRecord};
use crate::store::Store;
use crate::validate::Barcode;

/// Что сделать с распознанным продуктом.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scan,
    ScanAndSave,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Scan => "scan",
            Action::ScanAndSave => "scan_and_save",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("action must be 'scan' or 'scan_and_save', got {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Action::Scan),
            "scan_and_save" => Ok(Action::ScanAndSave),
            _ => Err(UnknownAction(s.to_owned())),
        }
    }
}

/// Почему у штрих-кода нет карточки.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMiss {
    /// Каталог ответил, что такого продукта нет.
    NotFound,
    /// Каталог недоступен: таймаут, сеть, HTTP-ошибка, битый ответ.
    Unavailable(String),
}

/// Итог одного запроса.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    NotFound,
    InvalidFormat {
        text: String,
    },
    BarcodeOnly {
        barcode: Barcode,
        reason: LookupMiss,
    },
    Resolved {
        barcode: Barcode,
        record: NormalizedFoodRecord,
    },
    /// Штрих-код уже есть в инвентаре; возвращается сохранённая запись.
    AlreadyExists {
        record: InventoryRecord,
    },
    Saved {
        record: InventoryRecord,
    },
    /// Карточка собрана, но сохранить её не вышло.
    SaveFailed {
        barcode: Barcode,
        record: NormalizedFoodRecord,
        error: String,
    },
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::NotFound => "No barcode detected in the uploaded image",
            Outcome::InvalidFormat { .. } => "Invalid barcode format detected",
            Outcome::BarcodeOnly {
                reason: LookupMiss::NotFound,
                ..
            } => "Barcode detected but product not found in OpenFoodFacts database",
            Outcome::BarcodeOnly {
                reason: LookupMiss::Unavailable(_),
                ..
            } => "Barcode detected but OpenFoodFacts could not be reached",
            Outcome::Resolved { .. } => "Barcode detected successfully",
            Outcome::AlreadyExists { .. } => "Barcode detected and food already exists in database",
            Outcome::Saved { .. } => "Barcode detected and product saved to database",
            Outcome::SaveFailed { .. } => {
                "Barcode detected but error occurred while saving to database"
            }
        }
    }

    /// Успех с точки зрения вызывающей стороны: штрих-код найден и корректен.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::NotFound | Outcome::InvalidFormat { .. })
    }

    pub fn barcode(&self) -> Option<&Barcode> {
        match self {
            Outcome::NotFound | Outcome::InvalidFormat { .. } => None,
            Outcome::BarcodeOnly { barcode, .. }
            | Outcome::Resolved { barcode, .. }
            | Outcome::SaveFailed { barcode, .. } => Some(barcode),
            Outcome::AlreadyExists { record } | Outcome::Saved { record } => {
                Some(&record.food.barcode)
            }
        }
    }
}

/// Сценарий обогащения. Каталог и хранилище передаются снаружи.
#[derive(Debug)]
pub struct EnrichmentWorkflow<C, S, D = LinearDetector> {
    pipeline: Pipeline<D>,
    catalog: C,
    store: S,
}

impl<C, S> EnrichmentWorkflow<C, S, LinearDetector>
where
    C: ProductCatalog,
    S: Store,
{
    pub fn new(catalog: C, store: S) -> Self {
        Self::with_pipeline(Pipeline::new(), catalog, store)
    }
}

impl<C, S, D> EnrichmentWorkflow<C, S, D>
where
    C: ProductCatalog,
    S: Store,
    D: SymbolDetector,
{
    pub fn with_pipeline(pipeline: Pipeline<D>, catalog: C, store: S) -> Self {
        Self {
            pipeline,
            catalog,
            store,
        }
    }

    #[inline]
    pub fn pipeline(&self) -> &Pipeline<D> {
        &self.pipeline
    }

    #[inline]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Изображение пришло текстом в base64. Битый base64 — штрих-кода нет.
    pub fn handle_encoded(&self, encoded: &str, format: &str, action: Action) -> Outcome {
        match STANDARD.decode(encoded.trim()) {
            Ok(bytes) => self.handle(&bytes, format, action),
            Err(e) => {
                warn!(error = %e, "image payload is not valid base64");
                Outcome::NotFound
            }
        }
    }

    pub fn handle(&self, bytes: &[u8], format: &str, action: Action) -> Outcome {
        let texts = self.pipeline.detect(bytes, format);
        let Some(text) = texts.into_iter().next() else {
            return Outcome::NotFound;
        };

        let barcode = match Barcode::parse(&text) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "detected text is not a retail barcode");
                return Outcome::InvalidFormat { text };
            }
        };
        info!(barcode = %barcode, action = %action, "barcode detected");
        if !barcode.check_digit_ok() {
            debug!(barcode = %barcode, "check digit mismatch, continuing anyway");
        }

        let payload = match self.catalog.lookup(&barcode) {
            Ok(Some(p)) => p,
            Ok(None) => {
                info!(barcode = %barcode, "product not in catalog");
                return Outcome::BarcodeOnly {
                    barcode,
                    reason: LookupMiss::NotFound,
                };
            }
            Err(e) => {
                warn!(barcode = %barcode, error = %e, "catalog lookup failed");
                return Outcome::BarcodeOnly {
                    barcode,
                    reason: LookupMiss::Unavailable(e.to_string()),
                };
            }
        };

        let record = normalize(&barcode, &payload);
        match action {
            Action::Scan => Outcome::Resolved { barcode, record },
            Action::ScanAndSave => self.save(barcode, record),
        }
    }

    fn save(&self, barcode: Barcode, record: NormalizedFoodRecord) -> Outcome {
        let failed = |barcode, record, error: String| {
            warn!(error = %error, "could not save product");
            Outcome::SaveFailed {
                barcode,
                record,
                error,
            }
        };

        match self.store.find_by_barcode(&barcode) {
            Ok(Some(existing)) => {
                info!(barcode = %barcode, id = %existing.id, "product already in inventory");
                return Outcome::AlreadyExists { record: existing };
            }
            Ok(None) => {}
            Err(e) => return failed(barcode, record, e.to_string()),
        }

        match self.store.upsert(&record) {
            Ok(saved) => {
                info!(barcode = %barcode, id = %saved.id, name = %saved.food.name, "product saved");
                Outcome::Saved { record: saved }
            }
            Err(e) => failed(barcode, record, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductPayload;
    use crate::core::{DecodedSymbol, PixelGrid, Symbology};
    use crate::error::{CatalogError, StoreError};
    use crate::record::{EventKind, QuantityEvent};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::cell::Cell;
    use uuid::Uuid;

    /// Детектор, который «видит» заданный текст на любой картинке.
    struct Sees(Option<&'static str>);

    impl SymbolDetector for Sees {
        fn detect(&self, _grid: &PixelGrid) -> Vec<DecodedSymbol> {
            self.0
                .map(|t| vec![DecodedSymbol::new(Symbology::Unknown, t)])
                .unwrap_or_default()
        }
    }

    enum Reply {
        Product(serde_json::Value),
        Missing,
        Timeout,
    }

    struct FakeCatalog {
        reply: Reply,
        calls: Cell<usize>,
    }

    impl FakeCatalog {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Cell::new(0),
            }
        }
    }

    impl ProductCatalog for FakeCatalog {
        fn lookup(&self, _barcode: &Barcode) -> Result<Option<ProductPayload>, CatalogError> {
            self.calls.set(self.calls.get() + 1);
            match &self.reply {
                Reply::Product(v) => Ok(ProductPayload::from_value(v.clone())),
                Reply::Missing => Ok(None),
                Reply::Timeout => Err(CatalogError::Timeout),
            }
        }
    }

    struct BrokenStore;

    impl Store for BrokenStore {
        fn find_by_barcode(&self, _: &Barcode) -> Result<Option<InventoryRecord>, StoreError> {
            Ok(None)
        }

        fn upsert(&self, _: &NormalizedFoodRecord) -> Result<InventoryRecord, StoreError> {
            Err(StoreError::Unavailable("disk full".into()))
        }

        fn append_event(&self, id: Uuid, _: u32, _: EventKind) -> Result<QuantityEvent, StoreError> {
            Err(StoreError::UnknownRecord(id))
        }
    }

    fn png() -> Vec<u8> {
        let grid = PixelGrid::from_luma(4, 4, vec![200; 16]).unwrap();
        crate::one_d::synth::encode_png(&grid).unwrap()
    }

    fn nutella() -> Reply {
        Reply::Product(json!({
            "product_name": "Nutella",
            "brands": "Ferrero",
            "nutriments": {"energy-kcal_100g": 539, "proteins_100g": 0}
        }))
    }

    fn workflow<S: Store>(
        sees: Option<&'static str>,
        reply: Reply,
        store: S,
    ) -> EnrichmentWorkflow<FakeCatalog, S, Sees> {
        EnrichmentWorkflow::with_pipeline(
            Pipeline::with_detector(Sees(sees)),
            FakeCatalog::new(reply),
            store,
        )
    }

    #[test]
    fn nothing_detected() {
        let wf = workflow(None, nutella(), MemoryStore::new());
        let out = wf.handle(&png(), "png", Action::Scan);
        assert_eq!(out, Outcome::NotFound);
        assert!(!out.is_success());
        assert_eq!(wf.catalog().calls.get(), 0);
    }

    #[test]
    fn junk_bytes_are_not_found() {
        let wf = workflow(Some("3017620422003"), nutella(), MemoryStore::new());
        assert_eq!(wf.handle(b"definitely not an image", "png", Action::Scan), Outcome::NotFound);
    }

    #[test]
    fn non_retail_text_is_invalid_format() {
        let wf = workflow(Some("12345"), nutella(), MemoryStore::new());
        let out = wf.handle(&png(), "png", Action::ScanAndSave);
        assert_eq!(out, Outcome::InvalidFormat { text: "12345".into() });
        assert!(!out.is_success());
        assert_eq!(wf.catalog().calls.get(), 0);
        assert!(wf.store().is_empty());
    }

    #[test]
    fn scan_resolves_without_touching_store() {
        let wf = workflow(Some("3017620422003"), nutella(), MemoryStore::new());
        let out = wf.handle(&png(), "png", Action::Scan);
        let Outcome::Resolved { barcode, record } = &out else {
            panic!("unexpected {out:?}");
        };
        assert_eq!(barcode.as_str(), "3017620422003");
        assert_eq!(record.name, "Nutella");
        assert_eq!(record.calories, Some(539));
        assert_eq!(record.protein, None);
        assert!(out.is_success());
        assert!(wf.store().is_empty());
    }

    #[test]
    fn bad_check_digit_still_goes_to_catalog() {
        let wf = workflow(Some("3017620422004"), Reply::Missing, MemoryStore::new());
        let out = wf.handle(&png(), "png", Action::Scan);
        assert!(matches!(out, Outcome::BarcodeOnly { reason: LookupMiss::NotFound, .. }));
        assert_eq!(wf.catalog().calls.get(), 1);
    }

    #[test]
    fn timeout_is_barcode_only_and_not_cached() {
        let wf = workflow(Some("96385074"), Reply::Timeout, MemoryStore::new());
        for _ in 0..2 {
            let out = wf.handle(&png(), "png", Action::ScanAndSave);
            let Outcome::BarcodeOnly { barcode, reason } = &out else {
                panic!("unexpected {out:?}");
            };
            assert_eq!(barcode.as_str(), "96385074");
            assert!(matches!(reason, LookupMiss::Unavailable(_)));
            assert!(out.is_success());
        }
        assert_eq!(wf.catalog().calls.get(), 2);
        assert!(wf.store().is_empty());
    }

    #[test]
    fn save_then_already_exists() {
        let wf = workflow(Some("3017620422003"), nutella(), MemoryStore::new());
        let first = wf.handle(&png(), "png", Action::ScanAndSave);
        let Outcome::Saved { record: saved } = &first else {
            panic!("unexpected {first:?}");
        };
        assert_eq!(wf.store().len(), 1);

        let second = wf.handle(&png(), "png", Action::ScanAndSave);
        assert_eq!(second, Outcome::AlreadyExists { record: saved.clone() });
        assert_eq!(wf.store().len(), 1);
    }

    #[test]
    fn existing_record_wins_over_fresh_catalog_data() {
        let store = MemoryStore::new();
        let wf = workflow(Some("3017620422003"), nutella(), &store);
        let Outcome::Saved { record } = wf.handle(&png(), "png", Action::ScanAndSave) else {
            panic!("first save failed");
        };
        store.append_event(record.id, 2, EventKind::Added).unwrap();

        let fresh = Reply::Product(json!({"product_name": "Nutella 2.0", "brands": "Other"}));
        let wf = workflow(Some("3017620422003"), fresh, &store);
        let out = wf.handle(&png(), "png", Action::ScanAndSave);
        let Outcome::AlreadyExists { record: existing } = out else {
            panic!("unexpected outcome");
        };
        assert_eq!(existing.id, record.id);
        assert_eq!(existing.food.name, "Nutella");
        assert_eq!(existing.food.quantity, 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn storage_failure_keeps_candidate() {
        let wf = workflow(Some("3017620422003"), nutella(), BrokenStore);
        let out = wf.handle(&png(), "png", Action::ScanAndSave);
        let Outcome::SaveFailed { barcode, record, error } = &out else {
            panic!("unexpected {out:?}");
        };
        assert_eq!(barcode.as_str(), "3017620422003");
        assert_eq!(record.name, "Nutella");
        assert!(error.contains("disk full"));
        assert!(out.is_success());
    }

    #[test]
    fn encoded_payload() {
        let wf = workflow(Some("96385074"), Reply::Missing, MemoryStore::new());
        let encoded = STANDARD.encode(png());
        let out = wf.handle_encoded(&encoded, "png", Action::Scan);
        assert_eq!(out.barcode().map(Barcode::as_str), Some("96385074"));
        assert_eq!(
            wf.handle_encoded("@@not base64@@", "png", Action::Scan),
            Outcome::NotFound
        );
    }

    #[test]
    fn outcome_json_is_tagged() {
        let out = Outcome::BarcodeOnly {
            barcode: Barcode::parse("96385074").unwrap(),
            reason: LookupMiss::Unavailable("catalog request timed out".into()),
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["outcome"], "barcode_only");
        assert_eq!(v["barcode"], "96385074");
        assert_eq!(v["reason"]["unavailable"], "catalog request timed out");
        assert_eq!(serde_json::to_value(Outcome::NotFound).unwrap(), json!({"outcome": "not_found"}));
    }

    #[test]
    fn action_parsing() {
        assert_eq!("scan".parse::<Action>().unwrap(), Action::Scan);
        assert_eq!("scan_and_save".parse::<Action>().unwrap(), Action::ScanAndSave);
        assert!("save".parse::<Action>().is_err());
    }
}
