use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{id_value, Record, RecordStore, StoreError};

/// In-memory store for tests and local development. Declares the same
/// unique-field constraints the Postgres schema carries as indexes.
#[derive(Default)]
pub struct MemoryRecordStore {
    unique: Vec<(String, String)>,
    records: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `field` must be unique among `entity` records.
    pub fn with_unique(mut self, entity: &str, field: &str) -> Self {
        self.unique.push((entity.to_string(), field.to_string()));
        self
    }
}

fn matches(record: &Record, filter: &Record) -> bool {
    filter.iter().all(|(k, v)| record.get(k) == Some(v))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, entity: &str, record: Record) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let rows = records.entry(entity.to_string()).or_default();

        for (ent, field) in &self.unique {
            if ent != entity {
                continue;
            }
            if let Some(value) = record.get(field) {
                if rows.iter().any(|r| r.get(field) == Some(value)) {
                    return Err(StoreError::UniqueViolation {
                        entity: entity.to_string(),
                        field: field.clone(),
                    });
                }
            }
        }

        rows.push(record.clone());
        Ok(record)
    }

    async fn find(&self, entity: &str, filter: &Record) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().await;
        let found = records
            .get(entity)
            .and_then(|rows| rows.iter().find(|r| matches(r, filter)).cloned());
        Ok(found)
    }

    async fn find_all(&self, entity: &str, filter: &Record) -> Result<Vec<Record>, StoreError> {
        let records = self.records.read().await;
        let found = records
            .get(entity)
            .map(|rows| rows.iter().filter(|r| matches(r, filter)).cloned().collect())
            .unwrap_or_default();
        Ok(found)
    }

    async fn update(&self, entity: &str, id: Uuid, patch: Record) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let id_val = id_value(id);
        let row = records
            .get_mut(entity)
            .and_then(|rows| rows.iter_mut().find(|r| r.get("id") == Some(&id_val)))
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id,
            })?;

        for (k, v) in patch {
            if v.is_null() {
                row.remove(&k);
            } else {
                row.insert(k, v);
            }
        }
        Ok(row.clone())
    }

    async fn update_guarded(
        &self,
        entity: &str,
        id: Uuid,
        guard: &Record,
        patch: Record,
    ) -> Result<Option<Record>, StoreError> {
        let mut records = self.records.write().await;
        let id_val = id_value(id);
        let row = records
            .get_mut(entity)
            .and_then(|rows| rows.iter_mut().find(|r| r.get("id") == Some(&id_val)))
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id,
            })?;

        if !matches(row, guard) {
            return Ok(None);
        }

        for (k, v) in patch {
            if v.is_null() {
                row.remove(&k);
            } else {
                row.insert(k, v);
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, entity: &str, id: Uuid) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let id_val = id_value(id);
        let rows = records
            .get_mut(entity)
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id,
            })?;
        let pos = rows
            .iter()
            .position(|r| r.get("id") == Some(&id_val))
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_string(),
                id,
            })?;
        Ok(rows.remove(pos))
    }
}
