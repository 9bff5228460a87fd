//! # Credential Lifecycle
//!
//! Endpoints for issuing signed Verifiable Credentials against a
//! registered schema, fetching them, updating their claims, and revoking
//! them. This module is where claims become evidence: validated against
//! the schema, wrapped in a W3C envelope, and signed with the gateway's
//! issuer key.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/cred` — issue a credential.
//! - `GET /api/v1/cred/{id}` — fetch a credential.
//! - `PUT /api/v1/cred/update/{id}` — update claims (re-validates, re-signs).
//! - `POST /api/v1/cred/revoke/{id}` — revoke (terminal).
//!
//! ## Lifecycle
//!
//! `active → revoked`, one way. Updating or re-revoking a revoked
//! credential is a 409; the version counter starts at 1 and increments on
//! every successful update.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{sha256_digest, CanonicalBytes};
use attest_ledger::AnchorReceipt;
use attest_schema::{schema_urn, validate_claims};
use attest_vc::{
    ContextValue, CredentialSchemaRef, CredentialStatus, CredentialTypeValue, ProofValue,
    VerifiableCredential,
};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, CredentialRecord, SchemaRecord};

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to issue a new credential.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueCredentialRequest {
    /// The schema the claims must conform to.
    pub schema_id: Uuid,
    /// The claims to attest. Must be a JSON object.
    #[schema(value_type = Object)]
    pub claims: serde_json::Value,
    /// Optional holder DID, recorded as `credentialSubject.id`.
    pub holder: Option<String>,
    /// Optional expiration date for the credential.
    pub expiration_date: Option<DateTime<Utc>>,
}

impl Validate for IssueCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if !self.claims.is_object() {
            return Err("claims must be a JSON object".to_string());
        }
        if let Some(ref holder) = self.holder {
            if holder.trim().is_empty() {
                return Err("holder must not be empty if provided".to_string());
            }
        }
        Ok(())
    }
}

/// Request to update an existing credential's claims.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCredentialRequest {
    /// Replacement claims. Must be a JSON object and must validate against
    /// the credential's schema.
    #[schema(value_type = Object)]
    pub claims: serde_json::Value,
}

impl Validate for UpdateCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if !self.claims.is_object() {
            return Err("claims must be a JSON object".to_string());
        }
        Ok(())
    }
}

/// Response after a revocation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    pub id: Uuid,
    /// Always `revoked` on success.
    #[schema(value_type = String)]
    pub status: CredentialStatus,
    pub revoked_at: DateTime<Utc>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the credential router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/cred", post(issue_credential))
        .route("/api/v1/cred/{id}", get(get_credential))
        .route("/api/v1/cred/update/{id}", put(update_credential))
        .route("/api/v1/cred/revoke/{id}", post(revoke_credential))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/cred — Issue a credential.
///
/// Fails with 404 if the schema does not exist and 422 if the claims do
/// not validate against it. On success the stored record carries the
/// signed W3C envelope with a `credentialSchema` reference and a single
/// issuer proof.
#[utoipa::path(
    post,
    path = "/api/v1/cred",
    request_body = IssueCredentialRequest,
    responses(
        (status = 201, description = "Credential issued", body = CredentialRecord),
        (status = 404, description = "Schema not found", body = crate::error::ErrorBody),
        (status = 422, description = "Claims failed schema validation", body = crate::error::ErrorBody),
    ),
    tag = "credential"
)]
pub async fn issue_credential(
    State(state): State<AppState>,
    body: Result<Json<IssueCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialRecord>), AppError> {
    let req = extract_validated_json(body)?;

    let schema = state
        .schemas
        .get(&req.schema_id)
        .ok_or_else(|| AppError::NotFound(format!("schema {} not found", req.schema_id)))?;

    validate_claims(&schema.definition, &req.claims)?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let vc = build_signed_credential(
        &state,
        &schema,
        id,
        req.claims,
        req.holder.as_deref(),
        req.expiration_date,
        now,
    )?;

    let record = CredentialRecord {
        id,
        schema_id: schema.id,
        status: CredentialStatus::Active,
        version: 1,
        credential: vc,
        created_at: now,
        updated_at: now,
        revoked_at: None,
    };

    // Every credential revision leaves a tamper-evident trace on the
    // registry ledger.
    let receipt = anchor_credential(&state, &record).await?;

    if let Some(pool) = &state.pool {
        crate::db::credentials::insert(pool, &record).await?;
    }
    state.credentials.insert(id, record.clone());

    tracing::info!(
        credential_id = %id,
        schema_id = %schema.id,
        anchor_height = receipt.height,
        "credential issued"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/cred/{id} — Fetch a credential.
#[utoipa::path(
    get,
    path = "/api/v1/cred/{id}",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "Credential found", body = CredentialRecord),
        (status = 404, description = "Credential not found", body = crate::error::ErrorBody),
    ),
    tag = "credential"
)]
pub async fn get_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CredentialRecord>, AppError> {
    state
        .credentials
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))
}

/// PUT /api/v1/cred/update/{id} — Update a credential's claims.
///
/// Re-validates the new claims against the credential's schema, rebuilds
/// and re-signs the envelope, and bumps the version. A revoked credential
/// is terminal: the update fails with 409.
#[utoipa::path(
    put,
    path = "/api/v1/cred/update/{id}",
    params(("id" = Uuid, Path, description = "Credential ID")),
    request_body = UpdateCredentialRequest,
    responses(
        (status = 200, description = "Credential updated", body = CredentialRecord),
        (status = 404, description = "Credential not found", body = crate::error::ErrorBody),
        (status = 409, description = "Credential is revoked", body = crate::error::ErrorBody),
        (status = 422, description = "Claims failed schema validation", body = crate::error::ErrorBody),
    ),
    tag = "credential"
)]
pub async fn update_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCredentialRequest>, JsonRejection>,
) -> Result<Json<CredentialRecord>, AppError> {
    let req = extract_validated_json(body)?;

    let current = state
        .credentials
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))?;

    // Cheap rejection before any signing work.
    current.status.ensure_updatable()?;

    let schema = state.schemas.get(&current.schema_id).ok_or_else(|| {
        AppError::Internal(format!(
            "credential {id} references missing schema {}",
            current.schema_id
        ))
    })?;

    validate_claims(&schema.definition, &req.claims)?;

    let now = Utc::now();
    let mut vc = current.credential.clone();
    vc.credential_subject = subject_with_holder(req.claims, holder_of(&current.credential));
    vc.proof.clear();
    vc.sign_ed25519(&state.issuer, state.verification_method(), None)?;

    // Commit under one write lock; the status re-check catches a
    // revocation that raced in between.
    let updated = state
        .credentials
        .try_update(&id, |record| {
            record.status.ensure_updatable()?;
            record.credential = vc.clone();
            record.version += 1;
            record.updated_at = now;
            Ok::<CredentialRecord, attest_vc::LifecycleError>(record.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))??;

    let receipt = anchor_credential(&state, &updated).await?;

    if let Some(pool) = &state.pool {
        crate::db::credentials::update(pool, &updated).await?;
    }

    tracing::info!(
        credential_id = %id,
        version = updated.version,
        anchor_height = receipt.height,
        "credential updated"
    );
    Ok(Json(updated))
}

/// POST /api/v1/cred/revoke/{id} — Revoke a credential.
///
/// One-way terminal transition. Revoking an already-revoked credential
/// fails with 409 so the caller learns the state it conflicted with.
#[utoipa::path(
    post,
    path = "/api/v1/cred/revoke/{id}",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "Credential revoked", body = RevokeResponse),
        (status = 404, description = "Credential not found", body = crate::error::ErrorBody),
        (status = 409, description = "Credential already revoked", body = crate::error::ErrorBody),
    ),
    tag = "credential"
)]
pub async fn revoke_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RevokeResponse>, AppError> {
    let now = Utc::now();

    let revoked = state
        .credentials
        .try_update(&id, |record| {
            record.status.revoke()?;
            record.revoked_at = Some(now);
            record.updated_at = now;
            Ok::<CredentialRecord, attest_vc::LifecycleError>(record.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))??;

    if let Some(pool) = &state.pool {
        crate::db::credentials::update(pool, &revoked).await?;
    }

    tracing::info!(credential_id = %id, "credential revoked");
    Ok(Json(RevokeResponse {
        id,
        status: revoked.status,
        revoked_at: now,
    }))
}

// ── Credential construction ─────────────────────────────────────────

/// Build and sign the W3C envelope for a new credential.
fn build_signed_credential(
    state: &AppState,
    schema: &SchemaRecord,
    id: Uuid,
    claims: serde_json::Value,
    holder: Option<&str>,
    expiration_date: Option<DateTime<Utc>>,
    issued_at: DateTime<Utc>,
) -> Result<VerifiableCredential, AppError> {
    let mut vc = VerifiableCredential {
        context: ContextValue::default(),
        id: Some(format!("urn:attest:cred:{id}")),
        credential_type: CredentialTypeValue::Array(vec![
            "VerifiableCredential".to_string(),
            "AttestGatewayCredential".to_string(),
        ]),
        issuer: state.issuer_did.clone(),
        issuance_date: issued_at,
        expiration_date,
        credential_schema: Some(CredentialSchemaRef::json_schema(schema_urn(
            &schema.id.into(),
        ))),
        credential_subject: subject_with_holder(claims, holder.map(String::from)),
        proof: ProofValue::default(),
    };

    vc.sign_ed25519(&state.issuer, state.verification_method(), None)?;
    Ok(vc)
}

/// Anchor one revision of a credential on the registry ledger.
///
/// The anchored payload tags the signed envelope with the credential id
/// and version, so every revision digests to a distinct, write-once chain
/// record.
async fn anchor_credential(
    state: &AppState,
    record: &CredentialRecord,
) -> Result<AnchorReceipt, AppError> {
    let payload = serde_json::json!({
        "credential_id": record.id,
        "version": record.version,
        "credential": serde_json::to_value(&record.credential)
            .map_err(|e| AppError::Internal(format!("credential serialization failed: {e}")))?,
    });
    let canonical = CanonicalBytes::new(&payload)
        .map_err(|e| AppError::Internal(format!("anchor canonicalization failed: {e}")))?;

    let receipt = state.ledger.anchor(sha256_digest(&canonical), &state.issuer_did)?;

    if let Some(pool) = &state.pool {
        crate::db::anchors::insert(pool, &receipt).await?;
    }
    Ok(receipt)
}

/// Inject the holder DID into the claims object as `credentialSubject.id`.
fn subject_with_holder(claims: serde_json::Value, holder: Option<String>) -> serde_json::Value {
    match (claims, holder) {
        (serde_json::Value::Object(mut map), Some(holder)) => {
            map.insert("id".to_string(), serde_json::Value::String(holder));
            serde_json::Value::Object(map)
        }
        (claims, _) => claims,
    }
}

/// Read the holder DID back out of an existing envelope, so updates keep it.
fn holder_of(vc: &VerifiableCredential) -> Option<String> {
    vc.credential_subject
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
}

// ── Tests ───────────────────────────────────────────────────────────
