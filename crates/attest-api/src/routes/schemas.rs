//! # Schema Registry
//!
//! Endpoints for registering credential schemas and fetching them by
//! identifier. Schemas are immutable once created — there is deliberately
//! no update or delete route — and every registered definition must itself
//! compile as a JSON Schema document before it is accepted.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/schema` — register a schema.
//! - `GET /api/v1/schema/{id}` — fetch a schema.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_schema::{compile_definition, schema_urn};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, SchemaRecord};

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to register a new credential schema.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSchemaRequest {
    /// Human-readable schema name.
    pub name: String,
    /// The JSON Schema document credentials will be validated against.
    #[schema(value_type = Object)]
    pub definition: serde_json::Value,
}

impl Validate for CreateSchemaRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.name.len() > 255 {
            return Err("name must not exceed 255 characters".to_string());
        }
        if !self.definition.is_object() {
            return Err("definition must be a JSON object".to_string());
        }
        Ok(())
    }
}

/// A registered schema as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchemaResponse {
    pub id: Uuid,
    /// URN under which credentials reference this schema.
    pub urn: String,
    pub name: String,
    #[schema(value_type = Object)]
    pub definition: serde_json::Value,
    /// DID of the delegate that registered the schema.
    pub created_by: String,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<SchemaRecord> for SchemaResponse {
    fn from(record: SchemaRecord) -> Self {
        Self {
            urn: schema_urn(&record.id.into()),
            id: record.id,
            name: record.name,
            definition: record.definition,
            created_by: record.created_by,
            created_at: record.created_at,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the schema router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/schema", post(create_schema))
        .route("/api/v1/schema/{id}", get(get_schema))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/schema — Register a new credential schema.
///
/// The definition is compiled under JSON Schema draft 2020-12 at
/// registration time; a definition that does not compile never reaches
/// the store.
#[utoipa::path(
    post,
    path = "/api/v1/schema",
    request_body = CreateSchemaRequest,
    responses(
        (status = 201, description = "Schema registered", body = SchemaResponse),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "schema"
)]
pub async fn create_schema(
    State(state): State<AppState>,
    body: Result<Json<CreateSchemaRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SchemaResponse>), AppError> {
    let req = extract_validated_json(body)?;

    // Registration-time compile check.
    compile_definition(&req.definition)?;

    let record = SchemaRecord {
        id: Uuid::new_v4(),
        name: req.name,
        definition: req.definition,
        created_by: state.issuer_did.clone(),
        created_at: Utc::now(),
    };

    if let Some(pool) = &state.pool {
        crate::db::schemas::insert(pool, &record).await?;
    }
    state.schemas.insert(record.id, record.clone());

    tracing::info!(schema_id = %record.id, name = %record.name, "schema registered");
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /api/v1/schema/{id} — Fetch a schema by identifier.
#[utoipa::path(
    get,
    path = "/api/v1/schema/{id}",
    params(("id" = Uuid, Path, description = "Schema ID")),
    responses(
        (status = 200, description = "Schema found", body = SchemaResponse),
        (status = 404, description = "Schema not found", body = crate::error::ErrorBody),
    ),
    tag = "schema"
)]
pub async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SchemaResponse>, AppError> {
    state
        .schemas
        .get(&id)
        .map(|record| Json(record.into()))
        .ok_or_else(|| AppError::NotFound(format!("schema {id} not found")))
}

// ── Tests ───────────────────────────────────────────────────────────
