//! Внешний каталог продуктов (OpenFoodFacts) и «сырой» ответ о продукте.
//!
//! Каталог вызывается не больше одного раза на запрос, с ограничением по
//! времени и без повторов. Любой сбой здесь для сценария не фатален.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::validate::Barcode;

/// Объект `product` из ответа каталога: нетипизированный, поля могут
/// отсутствовать, быть нулями или иметь неожиданный тип.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductPayload(Map<String, Value>);

impl ProductPayload {
    #[inline]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Только JSON-объект может быть продуктом.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Поле из вложенного `nutriments`, если он объект.
    pub fn nutriment(&self, key: &str) -> Option<&Value> {
        self.0.get("nutriments")?.as_object()?.get(key)
    }
}

/// Поиск продукта по штрих-коду. `Ok(None)` — каталог ответил «не знаю такой».
pub trait ProductCatalog {
    fn lookup(&self, barcode: &Barcode) -> Result<Option<ProductPayload>, CatalogError>;
}

impl<T: ProductCatalog + ?Sized> ProductCatalog for &T {
    #[inline]
    fn lookup(&self, barcode: &Barcode) -> Result<Option<ProductPayload>, CatalogError> {
        (**self).lookup(barcode)
    }
}

impl<T: ProductCatalog + ?Sized> ProductCatalog for Box<T> {
    #[inline]
    fn lookup(&self, barcode: &Barcode) -> Result<Option<ProductPayload>, CatalogError> {
        (**self).lookup(barcode)
    }
}

/// Ответ `GET /api/v0/product/{barcode}.json`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    product: Option<Value>,
}

impl LookupResponse {
    fn into_payload(self) -> Option<ProductPayload> {
        let missing = match &self.status {
            Some(Value::Number(n)) => n.as_i64() == Some(0),
            Some(Value::String(s)) => s.trim() == "0",
            _ => false,
        };
        if missing {
            return None;
        }
        self.product.and_then(ProductPayload::from_value)
    }
}

/// Блокирующий HTTP-клиент OpenFoodFacts.
#[derive(Clone, Debug)]
pub struct OpenFoodFactsClient {
    http: Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.as_str())
            .build()?;
        Ok(Self::with_http(http, &cfg.base_url))
    }

    /// Клиент поверх готового `reqwest`-клиента (свои прокси, TLS, таймауты).
    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn product_url(&self, barcode: &Barcode) -> String {
        format!("{}/api/v0/product/{}.json", self.base_url, barcode)
    }
}

impl ProductCatalog for OpenFoodFactsClient {
    fn lookup(&self, barcode: &Barcode) -> Result<Option<ProductPayload>, CatalogError> {
        let url = self.product_url(barcode);
        debug!(url = %url, "querying product catalog");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: LookupResponse = response.json()?;
        Ok(body.into_payload())
    }
}
