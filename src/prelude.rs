// src/prelude.rs
//
// `use foodscan::prelude::*;` — всё, что нужно для типичного сценария.

pub use crate::api::{Detection, Pipeline, Stage, SymbolDetector};
pub use crate::cascade::{Cascade, VariantKind};
pub use crate::catalog::{OpenFoodFactsClient, ProductCatalog, ProductPayload};
pub use crate::config::Config;
pub use crate::core::{DecodedSymbol, PixelGrid, Symbology};
pub use crate::error::{CatalogError, ConfigError, DecodeError, StoreError};
pub use crate::normalize::normalize;
pub use crate::one_d::{DecodeOptions, LinearDetector};
pub use crate::record::{EventKind, InventoryRecord, NormalizedFoodRecord, QuantityEvent};
pub use crate::store::{MemoryStore, Store};
pub use crate::validate::{is_valid_barcode, Barcode};
pub use crate::workflow::{Action, EnrichmentWorkflow, LookupMiss, Outcome};
