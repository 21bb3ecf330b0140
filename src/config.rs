//! Конфигурация из TOML.
//!
//! Файл выбирается так:
//! 1. аргумент `--config <path>`;
//! 2. переменная окружения `FOODSCAN_CONFIG`;
//! 3. иначе встроенные значения по умолчанию (без файла).
//!
//! Все поля необязательны.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::one_d::DecodeOptions;

pub const CONFIG_ENV: &str = "FOODSCAN_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub detector: DecodeOptions,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Ограничение на весь запрос к каталогу, секунды.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org".to_string(),
            timeout_secs: 10,
            user_agent: concat!("foodscan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-снимок инвентаря для CLI.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("inventory.json"),
        }
    }
}

impl Config {
    /// Путь к файлу по порядку приоритетов; `None` — работать на умолчаниях.
    pub fn resolve_path(cli: Option<&Path>, env_value: Option<OsString>) -> Option<PathBuf> {
        cli.map(Path::to_path_buf)
            .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
    }

    /// Загрузить конфигурацию для CLI: `--config`, затем `FOODSCAN_CONFIG`.
    pub fn resolve(cli: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::resolve_path(cli, env::var_os(CONFIG_ENV)) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("no config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: origin.clone(),
            source,
        })?;
        let cfg = Self::from_toml_str(&content, &origin)?;
        debug!(path = %origin, "config loaded");
        Ok(cfg)
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        cfg.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let url = self.catalog.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "catalog.base_url must be an http(s) URL, got {url:?}"
            )));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid("catalog.timeout_secs must be positive".into()));
        }
        if self.detector.scan_rows == 0 {
            return Err(ConfigError::Invalid("detector.scan_rows must be positive".into()));
        }
        Ok(self)
    }
}
