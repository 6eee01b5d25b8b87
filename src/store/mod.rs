mod memory;
mod pg;

pub use memory::MemoryRecordStore;
pub use pg::PgRecordStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// A schemaless entity record. Field validation happens above this layer
/// (see [`crate::entity`]); the store only persists and filters.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique field {field} violated for {entity}")]
    UniqueViolation { entity: String, field: String },

    #[error("no {entity} record with id {id}")]
    NotFound { entity: String, id: Uuid },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Narrow persistence boundary. Durable state lives only behind this trait;
/// filters are exact-match on every given key, and "nothing matched" is
/// never an error for reads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record, enforcing the store's unique-field constraints.
    async fn create(&self, entity: &str, record: Record) -> Result<Record, StoreError>;

    /// First record matching every key of `filter` exactly, or `None`.
    async fn find(&self, entity: &str, filter: &Record) -> Result<Option<Record>, StoreError>;

    /// All records matching `filter`; an empty filter matches everything.
    async fn find_all(&self, entity: &str, filter: &Record) -> Result<Vec<Record>, StoreError>;

    /// Shallow-merge `patch` into the record. A JSON `null` value removes
    /// the field, which is how one-time keys get consumed.
    async fn update(&self, entity: &str, id: Uuid, patch: Record) -> Result<Record, StoreError>;

    /// Like [`update`](Self::update), but applies the patch only while the
    /// record still matches every key of `guard` exactly. Returns `Ok(None)`
    /// when the record exists but the guard no longer holds. Check and merge
    /// happen in one step, so of two racing callers guarding on the same
    /// one-time key, exactly one wins.
    async fn update_guarded(
        &self,
        entity: &str,
        id: Uuid,
        guard: &Record,
        patch: Record,
    ) -> Result<Option<Record>, StoreError>;

    /// Remove the record and return it.
    async fn delete(&self, entity: &str, id: Uuid) -> Result<Record, StoreError>;
}

pub(crate) fn id_value(id: Uuid) -> serde_json::Value {
    serde_json::Value::String(id.to_string())
}
