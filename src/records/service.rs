use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::entity::{EntitySchema, EntityService};
use crate::error::{ApiError, ApiResult};
use crate::store::{id_value, Record, RecordStore};

/// CRUD over a user-owned sub-entity (awards, certificates, careers, tech
/// stacks). The generic service covers validation and reads; this layer
/// supplies the update/delete policy: owner-gated, whitelist-projected
/// key/value patches.
#[derive(Clone)]
pub struct OwnedRecordService {
    entities: EntityService,
}

impl OwnedRecordService {
    pub fn new(schema: &'static EntitySchema, store: Arc<dyn RecordStore>) -> Self {
        Self {
            entities: EntityService::new(schema, store),
        }
    }

    fn schema(&self) -> &'static EntitySchema {
        self.entities.schema()
    }

    fn store(&self) -> &Arc<dyn RecordStore> {
        self.entities.store()
    }

    /// Create a record owned by the caller. Whatever owner value the
    /// payload carried is overwritten with the authenticated id.
    pub async fn add(&self, caller: Uuid, mut record: Record) -> ApiResult<Record> {
        record.insert(self.schema().owner_field.to_string(), id_value(caller));
        let added = self.entities.add(record).await?;
        info!(entity = self.schema().name, owner = %caller, "owned record added");
        Ok(added)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Option<Record>> {
        self.entities.get(id).await
    }

    pub async fn get_all(&self, filter: Record) -> ApiResult<Vec<Record>> {
        self.entities.get_all(filter).await
    }

    pub async fn get_user_owned(&self, user_id: Uuid) -> ApiResult<Vec<Record>> {
        self.entities.get_user_owned(user_id).await
    }

    fn assert_owner(&self, caller: Uuid, record: &Record) -> ApiResult<()> {
        let owner = record
            .get(self.schema().owner_field)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        if owner != Some(caller) {
            return Err(ApiError::Forbidden(format!(
                "caller {caller} does not own this {} record",
                self.schema().name
            )));
        }
        Ok(())
    }

    /// Patch whitelisted fields of a record the caller owns.
    pub async fn set(&self, caller: Uuid, id: Uuid, pairs: Record) -> ApiResult<Record> {
        let record = self.get(id).await?.ok_or_else(|| {
            ApiError::NotFound(format!("no {} record with id {id}", self.schema().name))
        })?;
        self.assert_owner(caller, &record)?;

        let mut patch = self.schema().project(pairs);
        // The owner reference is set at creation and stays put.
        patch.remove(self.schema().owner_field);

        let updated = self.store().update(self.schema().name, id, patch).await?;
        Ok(updated)
    }

    /// Delete a record the caller owns; returns the removed record.
    pub async fn del(&self, caller: Uuid, id: Uuid) -> ApiResult<Record> {
        let record = self.get(id).await?.ok_or_else(|| {
            ApiError::NotFound(format!("no {} record with id {id}", self.schema().name))
        })?;
        self.assert_owner(caller, &record)?;

        let removed = self.store().delete(self.schema().name, id).await?;
        info!(entity = self.schema().name, %id, "owned record removed");
        Ok(removed)
    }
}
