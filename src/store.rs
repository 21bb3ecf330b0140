//! Хранилище инвентаря.
//!
//! `Store` — то, что нужно сценарию от хранилища. `MemoryStore` держит всё
//! в памяти под мьютексом и умеет сохраняться в JSON-снимок для CLI.

use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{EventKind, InventoryRecord, NormalizedFoodRecord, QuantityEvent};
use crate::validate::Barcode;

pub trait Store {
    /// Первая сохранённая партия с этим штрих-кодом.
    fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<InventoryRecord>, StoreError>;

    /// Слить присутствующие поля в существующую партию с тем же
    /// штрих-кодом или создать новую. Возвращает итоговую запись.
    fn upsert(&self, food: &NormalizedFoodRecord) -> Result<InventoryRecord, StoreError>;

    fn append_event(
        &self,
        record_id: Uuid,
        quantity: u32,
        kind: EventKind,
    ) -> Result<QuantityEvent, StoreError>;
}

impl<T: Store + ?Sized> Store for &T {
    fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<InventoryRecord>, StoreError> {
        (**self).find_by_barcode(barcode)
    }

    fn upsert(&self, food: &NormalizedFoodRecord) -> Result<InventoryRecord, StoreError> {
        (**self).upsert(food)
    }

    fn append_event(
        &self,
        record_id: Uuid,
        quantity: u32,
        kind: EventKind,
    ) -> Result<QuantityEvent, StoreError> {
        (**self).append_event(record_id, quantity, kind)
    }
}

impl<T: Store + ?Sized> Store for Box<T> {
    fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<InventoryRecord>, StoreError> {
        (**self).find_by_barcode(barcode)
    }

    fn upsert(&self, food: &NormalizedFoodRecord) -> Result<InventoryRecord, StoreError> {
        (**self).upsert(food)
    }

    fn append_event(
        &self,
        record_id: Uuid,
        quantity: u32,
        kind: EventKind,
    ) -> Result<QuantityEvent, StoreError> {
        (**self).append_event(record_id, quantity, kind)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Inventory {
    #[serde(default)]
    records: Vec<InventoryRecord>,
    #[serde(default)]
    events: Vec<QuantityEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inventory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Прочитать снимок; отсутствующий файл — пустой инвентарь.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no inventory snapshot yet");
            return Ok(Self::new());
        }
        let bytes = fs::read(path)?;
        let inventory: Inventory = serde_json::from_slice(&bytes)?;
        debug!(
            path = %path.display(),
            records = inventory.records.len(),
            events = inventory.events.len(),
            "inventory snapshot loaded"
        );
        Ok(Self {
            inner: Mutex::new(inventory),
        })
    }

    /// Записать снимок через временный файл рядом, затем переименовать.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = {
            let inv = self.inner.lock();
            serde_json::to_vec_pretty(&*inv)?
        };
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "inventory snapshot saved");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    pub fn records(&self) -> Vec<InventoryRecord> {
        self.inner.lock().records.clone()
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<InventoryRecord> {
        self.inner.lock().records.iter().find(|r| r.id == id).cloned()
    }

    /// Проставить срок годности и место хранения. Меняются только
    /// переданные значения.
    pub fn annotate(
        &self,
        record_id: Uuid,
        expiry_date: Option<NaiveDate>,
        location: Option<String>,
    ) -> Result<InventoryRecord, StoreError> {
        let mut inv = self.inner.lock();
        let record = inv
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or(StoreError::UnknownRecord(record_id))?;
        if expiry_date.is_some() {
            record.expiry_date = expiry_date;
        }
        if location.is_some() {
            record.location = location;
        }
        debug!(id = %record_id, expiry = ?record.expiry_date, location = ?record.location, "inventory record annotated");
        Ok(record.clone())
    }

    /// Партии, срок которых истекает в ближайшие `days` дней (включая
    /// сегодня), по возрастанию срока. Просроченные уже не попадают.
    pub fn expiring_within(&self, today: NaiveDate, days: u32) -> Vec<InventoryRecord> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let mut found: Vec<InventoryRecord> = self
            .inner
            .lock()
            .records
            .iter()
            .filter(|r| r.expiry_date.is_some_and(|d| today <= d && d <= until))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.expiry_date);
        found
    }

    /// События партии, новые первыми.
    pub fn events_for(&self, record_id: Uuid) -> Vec<QuantityEvent> {
        self.inner
            .lock()
            .events
            .iter()
            .rev()
            .filter(|e| e.record_id == record_id)
            .cloned()
            .collect()
    }
}

impl Store for MemoryStore {
    fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<InventoryRecord>, StoreError> {
        let inv = self.inner.lock();
        Ok(inv.records.iter().find(|r| &r.food.barcode == barcode).cloned())
    }

    fn upsert(&self, food: &NormalizedFoodRecord) -> Result<InventoryRecord, StoreError> {
        let mut inv = self.inner.lock();
        if let Some(existing) = inv.records.iter_mut().find(|r| r.food.barcode == food.barcode) {
            existing.food.merge_present(food);
            debug!(id = %existing.id, barcode = %food.barcode, "inventory record merged");
            return Ok(existing.clone());
        }

        let record = InventoryRecord::new(food.clone());
        info!(id = %record.id, barcode = %food.barcode, "inventory record created");
        inv.records.push(record.clone());
        Ok(record)
    }

    fn append_event(
        &self,
        record_id: Uuid,
        quantity: u32,
        kind: EventKind,
    ) -> Result<QuantityEvent, StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity);
        }

        let mut inv = self.inner.lock();
        let record = inv
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or(StoreError::UnknownRecord(record_id))?;

        let stock = &mut record.food.quantity;
        *stock = if kind.is_increase() {
            stock.saturating_add(quantity)
        } else {
            stock.saturating_sub(quantity)
        };
        let left = *stock;

        let event = QuantityEvent {
            id: Uuid::new_v4(),
            record_id,
            quantity,
            kind,
            timestamp: Utc::now(),
        };
        inv.events.push(event.clone());
        info!(id = %record_id, kind = %kind, quantity, left, "quantity event recorded");
        Ok(event)
    }
}
