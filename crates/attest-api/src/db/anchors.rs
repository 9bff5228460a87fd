//! Anchor persistence operations.
//!
//! Anchors are append-only; the `digest` and `height` UNIQUE constraints
//! back the write-once rule and the chain ordering. Rows are replayed
//! onto the in-process chain at startup, which re-verifies every hash.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attest_core::{AnchorId, ContentDigest, Timestamp};
use attest_ledger::AnchorReceipt;

/// Insert a freshly appended anchor record.
pub async fn insert(pool: &PgPool, receipt: &AnchorReceipt) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO anchors (id, digest, height, previous_hash, record_hash, delegate, anchored_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(receipt.anchor_id.as_uuid())
    .bind(receipt.digest.to_hex())
    .bind(receipt.height as i64)
    .bind(&receipt.previous_hash)
    .bind(&receipt.record_hash)
    .bind(&receipt.delegate)
    .bind(*receipt.anchored_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all anchors in height order for chain replay on startup.
///
/// A row with an unparseable digest aborts the load: the chain cannot be
/// partially replayed.
pub async fn load_all(pool: &PgPool) -> Result<Vec<AnchorReceipt>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AnchorRow>(
        "SELECT id, digest, height, previous_hash, record_hash, delegate, anchored_at
         FROM anchors ORDER BY height",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AnchorRow::into_receipt).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AnchorRow {
    id: Uuid,
    digest: String,
    height: i64,
    previous_hash: String,
    record_hash: String,
    delegate: String,
    anchored_at: DateTime<Utc>,
}

impl AnchorRow {
    fn into_receipt(self) -> Result<AnchorReceipt, sqlx::Error> {
        let digest = ContentDigest::from_hex(&self.digest).map_err(|e| {
            tracing::error!(id = %self.id, error = %e, "invalid digest in anchors table");
            sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("anchor {} has invalid digest: {e}", self.id),
            )))
        })?;

        Ok(AnchorReceipt {
            anchor_id: AnchorId::from(self.id),
            digest,
            height: self.height as u64,
            previous_hash: self.previous_hash,
            record_hash: self.record_hash,
            delegate: self.delegate,
            anchored_at: Timestamp::from_utc(self.anchored_at),
        })
    }
}
