use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Record, RecordStore, StoreError};

/// Production store: one `records` table holding every entity as jsonb,
/// with exact-match filters expressed as containment queries. Uniqueness
/// (the users email constraint) lives in a partial unique index, so a
/// concurrent duplicate insert loses at the database and surfaces here
/// as a unique violation.
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn record_id(record: &Record) -> Result<Uuid, StoreError> {
    record
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("record has no valid id field")))
}

fn into_record(value: serde_json::Value) -> Result<Record, StoreError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(anyhow::anyhow!(
            "stored fields are not an object: {other}"
        ))),
    }
}

fn map_sqlx(entity: &str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let field = db
                .constraint()
                .filter(|c| c.contains("email"))
                .map(|_| "email")
                .unwrap_or("unique field")
                .to_string();
            return StoreError::UniqueViolation {
                entity: entity.to_string(),
                field,
            };
        }
    }
    StoreError::Backend(e.into())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, entity: &str, record: Record) -> Result<Record, StoreError> {
        let id = record_id(&record)?;
        let stored = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            INSERT INTO records (entity, id, fields)
            VALUES ($1, $2, $3)
            RETURNING fields
            "#,
        )
        .bind(entity)
        .bind(id)
        .bind(serde_json::Value::Object(record))
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_sqlx(entity, e))?;
        into_record(stored)
    }

    async fn find(&self, entity: &str, filter: &Record) -> Result<Option<Record>, StoreError> {
        let found = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            SELECT fields FROM records
            WHERE entity = $1 AND fields @> $2
            LIMIT 1
            "#,
        )
        .bind(entity)
        .bind(serde_json::Value::Object(filter.clone()))
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_sqlx(entity, e))?;
        found.map(into_record).transpose()
    }

    async fn find_all(&self, entity: &str, filter: &Record) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            SELECT fields FROM records
            WHERE entity = $1 AND fields @> $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(entity)
        .bind(serde_json::Value::Object(filter.clone()))
        .fetch_all(&self.db)
        .await
        .map_err(|e| map_sqlx(entity, e))?;
        rows.into_iter().map(into_record).collect()
    }

    async fn update(&self, entity: &str, id: Uuid, patch: Record) -> Result<Record, StoreError> {
        // jsonb `||` merges the patch; strip_nulls then drops consumed
        // one-time keys, matching the trait's null-removes contract.
        let updated = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            UPDATE records
            SET fields = jsonb_strip_nulls(fields || $3)
            WHERE entity = $1 AND id = $2
            RETURNING fields
            "#,
        )
        .bind(entity)
        .bind(id)
        .bind(serde_json::Value::Object(patch))
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_sqlx(entity, e))?;
        match updated {
            Some(v) => into_record(v),
            None => Err(StoreError::NotFound {
                entity: entity.to_string(),
                id,
            }),
        }
    }

    async fn update_guarded(
        &self,
        entity: &str,
        id: Uuid,
        guard: &Record,
        patch: Record,
    ) -> Result<Option<Record>, StoreError> {
        // Containment in the WHERE clause makes check-and-merge a single
        // statement, so a racing caller guarding on the same one-time key
        // finds the guard already gone.
        let updated = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            UPDATE records
            SET fields = jsonb_strip_nulls(fields || $4)
            WHERE entity = $1 AND id = $2 AND fields @> $3
            RETURNING fields
            "#,
        )
        .bind(entity)
        .bind(id)
        .bind(serde_json::Value::Object(guard.clone()))
        .bind(serde_json::Value::Object(patch))
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_sqlx(entity, e))?;

        match updated {
            Some(v) => Ok(Some(into_record(v)?)),
            None => {
                // Distinguish a failed guard from a missing record.
                let exists = sqlx::query_scalar::<_, bool>(
                    r#"SELECT EXISTS (SELECT 1 FROM records WHERE entity = $1 AND id = $2)"#,
                )
                .bind(entity)
                .bind(id)
                .fetch_one(&self.db)
                .await
                .map_err(|e| map_sqlx(entity, e))?;
                if exists {
                    Ok(None)
                } else {
                    Err(StoreError::NotFound {
                        entity: entity.to_string(),
                        id,
                    })
                }
            }
        }
    }

    async fn delete(&self, entity: &str, id: Uuid) -> Result<Record, StoreError> {
        let removed = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            DELETE FROM records
            WHERE entity = $1 AND id = $2
            RETURNING fields
            "#,
        )
        .bind(entity)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_sqlx(entity, e))?;
        match removed {
            Some(v) => into_record(v),
            None => Err(StoreError::NotFound {
                entity: entity.to_string(),
                id,
            }),
        }
    }
}
