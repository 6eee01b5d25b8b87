use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store::{id_value, Record, RecordStore};

/// Immutable per-entity configuration. Required + optional is the full
/// whitelist; anything submitted outside it is dropped before persistence.
#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Name of the field referencing the owning user. Most entities use
    /// `user_id`; awards historically own `awardee_id`.
    pub owner_field: &'static str,
}

impl EntitySchema {
    pub fn allows(&self, field: &str) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    /// Whitelist projection: keep only declared fields, silently drop the
    /// rest. Null values are dropped too so a patch cannot sneak a field
    /// removal past the schema.
    pub fn project(&self, record: Record) -> Record {
        record
            .into_iter()
            .filter(|(k, v)| self.allows(k) && !v.is_null())
            .collect()
    }

    pub fn check_required(&self, record: &Record) -> ApiResult<()> {
        for field in self.required {
            if !record.contains_key(*field) {
                return Err(ApiError::Validation(format!(
                    "{field} field is required for a {} record",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Schema-validated CRUD primitives shared by every domain entity service.
/// Update/delete policy differs per entity and lives in the concrete
/// services instead.
#[derive(Clone)]
pub struct EntityService {
    schema: &'static EntitySchema,
    store: Arc<dyn RecordStore>,
}

impl EntityService {
    pub fn new(schema: &'static EntitySchema, store: Arc<dyn RecordStore>) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Project to the whitelist, check required fields, assign a fresh id
    /// and persist. Returns the stored record including the id.
    pub async fn add(&self, record: Record) -> ApiResult<Record> {
        let mut data = self.schema.project(record);
        self.schema.check_required(&data)?;

        let id = Uuid::new_v4();
        data.insert("id".to_string(), id_value(id));

        let added = self.store.create(self.schema.name, data).await?;
        debug!(entity = self.schema.name, %id, "record added");
        Ok(added)
    }

    /// Exact-match lookup by id. Absence is `Ok(None)`, not an error;
    /// callers decide whether missing means not-found.
    pub async fn get(&self, id: Uuid) -> ApiResult<Option<Record>> {
        let mut filter = Record::new();
        filter.insert("id".to_string(), id_value(id));
        Ok(self.store.find(self.schema.name, &filter).await?)
    }

    /// All records matching the optional exact-match filter.
    pub async fn get_all(&self, filter: Record) -> ApiResult<Vec<Record>> {
        Ok(self.store.find_all(self.schema.name, &filter).await?)
    }

    /// All records owned by `user_id`, honoring the schema's owner field.
    pub async fn get_user_owned(&self, user_id: Uuid) -> ApiResult<Vec<Record>> {
        let mut filter = Record::new();
        filter.insert(self.schema.owner_field.to_string(), id_value(user_id));
        Ok(self.store.find_all(self.schema.name, &filter).await?)
    }
}

#[cfg(test)]
pub(crate) fn parse_id(record: &Record) -> Option<Uuid> {
    record
        .get("id")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}
