//! Schema persistence operations.
//!
//! Schemas are immutable: there is insert and load, nothing else.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::SchemaRecord;

/// Insert a new schema record.
pub async fn insert(pool: &PgPool, record: &SchemaRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO schemas (id, name, definition, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.definition)
    .bind(&record.created_by)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all schemas into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<SchemaRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SchemaRow>(
        "SELECT id, name, definition, created_by, created_at
         FROM schemas ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SchemaRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SchemaRow {
    id: Uuid,
    name: String,
    definition: serde_json::Value,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl SchemaRow {
    fn into_record(self) -> SchemaRecord {
        SchemaRecord {
            id: self.id,
            name: self.name,
            definition: self.definition,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}
