//! Ошибки библиотеки.
//!
//! Ни одна из них не выходит за границу `EnrichmentWorkflow::handle`:
//! сценарий превращает их в варианты `Outcome`. Наружу их отдают только
//! низкоуровневые функции (декодер, клиент каталога, хранилище, конфиг).

use thiserror::Error;
use uuid::Uuid;

/// Байты не удалось разобрать как изображение.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty image payload")]
    Empty,

    #[error("unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),

    #[error("image has zero size ({width}x{height})")]
    ZeroSized { width: u32, height: u32 },
}

/// Сбой обращения к внешнему каталогу продуктов.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog request timed out")]
    Timeout,

    #[error("catalog transport error: {0}")]
    Transport(String),

    #[error("catalog returned HTTP {0}")]
    Status(u16),

    #[error("catalog response could not be parsed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::Parse(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

/// Сбой хранилища.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown inventory record {0}")]
    UnknownRecord(Uuid),

    #[error("event quantity must be positive")]
    InvalidQuantity,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot is malformed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Ошибка загрузки конфигурации.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
