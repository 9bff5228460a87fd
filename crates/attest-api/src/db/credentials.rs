//! Credential persistence operations.
//!
//! Lifecycle constraints (revocation is terminal, updates bump the
//! version) are enforced at the application layer; this module mirrors
//! the resulting state.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attest_vc::{CredentialStatus, VerifiableCredential};

use crate::state::CredentialRecord;

/// Serialize the signed credential envelope for the JSONB column.
fn serialize_credential(vc: &VerifiableCredential) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(vc).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize credential for persistence");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a newly issued credential.
pub async fn insert(pool: &PgPool, record: &CredentialRecord) -> Result<(), sqlx::Error> {
    let credential = serialize_credential(&record.credential)?;

    sqlx::query(
        "INSERT INTO credentials (id, schema_id, status, version, credential, created_at, updated_at, revoked_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(record.schema_id)
    .bind(record.status.as_str())
    .bind(record.version)
    .bind(&credential)
    .bind(record.created_at)
    .bind(record.updated_at)
    .bind(record.revoked_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the result of an update or revocation.
///
/// Returns whether a row was affected.
pub async fn update(pool: &PgPool, record: &CredentialRecord) -> Result<bool, sqlx::Error> {
    let credential = serialize_credential(&record.credential)?;

    let result = sqlx::query(
        "UPDATE credentials
         SET status = $1, version = $2, credential = $3, updated_at = $4, revoked_at = $5
         WHERE id = $6",
    )
    .bind(record.status.as_str())
    .bind(record.version)
    .bind(&credential)
    .bind(record.updated_at)
    .bind(record.revoked_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all credentials into the in-memory store on startup.
///
/// Rows whose stored envelope no longer deserializes are skipped with an
/// ERROR log rather than aborting startup; an unknown status string
/// fail-closes to `revoked`.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CredentialRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, schema_id, status, version, credential, created_at, updated_at, revoked_at
         FROM credentials ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(CredentialRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    schema_id: Uuid,
    status: String,
    version: i32,
    credential: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl CredentialRow {
    fn into_record(self) -> Option<CredentialRecord> {
        let status: CredentialStatus =
            serde_json::from_value(serde_json::Value::String(self.status.clone()))
                .unwrap_or_else(|e| {
                    // Read path: fail closed. A credential with an
                    // unreadable status must not come back active.
                    tracing::error!(
                        id = %self.id,
                        status = %self.status,
                        error = %e,
                        "unknown credential status in database — treating as revoked; \
                         investigate: this may indicate prior data corruption"
                    );
                    CredentialStatus::Revoked
                });

        let credential: VerifiableCredential = match serde_json::from_value(self.credential) {
            Ok(vc) => vc,
            Err(e) => {
                tracing::error!(
                    id = %self.id,
                    error = %e,
                    "stored credential envelope failed to deserialize — skipping row"
                );
                return None;
            }
        };

        Some(CredentialRecord {
            id: self.id,
            schema_id: self.schema_id,
            status,
            version: self.version,
            credential,
            created_at: self.created_at,
            updated_at: self.updated_at,
            revoked_at: self.revoked_at,
        })
    }
}
