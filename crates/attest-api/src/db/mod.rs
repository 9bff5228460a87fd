//! # Database Layer
//!
//! PostgreSQL persistence via sqlx. The in-memory stores are the runtime
//! system of record; every mutation is mirrored here and the stores are
//! hydrated from these tables at startup.
//!
//! Table constraints mirror the application rules where they are cheap to
//! state in SQL (`anchors.digest UNIQUE` backs the write-once anchor rule),
//! but state-machine constraints are enforced at the application layer.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod anchors;
pub mod credentials;
pub mod schemas;

/// Connect to PostgreSQL and verify the connection with a ping.
///
/// The gateway requires its database: callers treat any error here as
/// fatal at startup.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Create the gateway's tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schemas (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            definition JSONB NOT NULL,
            created_by TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS credentials (
            id UUID PRIMARY KEY,
            schema_id UUID NOT NULL REFERENCES schemas (id),
            status TEXT NOT NULL,
            version INTEGER NOT NULL,
            credential JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            revoked_at TIMESTAMPTZ
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS anchors (
            id UUID PRIMARY KEY,
            digest TEXT NOT NULL UNIQUE,
            height BIGINT NOT NULL UNIQUE,
            previous_hash TEXT NOT NULL,
            record_hash TEXT NOT NULL,
            delegate TEXT NOT NULL,
            anchored_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
