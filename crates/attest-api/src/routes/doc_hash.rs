//! # Document Hash Anchoring
//!
//! Endpoint for anchoring an externally computed document hash on the
//! registry ledger. The write is performed by the gateway's issuer
//! identity, which the bootstrap registered as a ledger delegate.
//!
//! Anchoring is write-once: the first writer of a digest wins and every
//! later attempt is answered with 409 and the original anchor id.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/docHash` — anchor a document hash.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::ContentDigest;
use attest_ledger::AnchorReceipt;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to anchor a document hash.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnchorHashRequest {
    /// SHA-256 hash of the document, 64 hex characters.
    pub hash: String,
}

impl Validate for AnchorHashRequest {
    fn validate(&self) -> Result<(), String> {
        if self.hash.trim().is_empty() {
            return Err("hash must not be empty".to_string());
        }
        Ok(())
    }
}

/// The ledger receipt returned after a successful anchor.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnchorReceiptResponse {
    pub anchor_id: Uuid,
    /// The anchored digest, lowercase hex.
    pub digest: String,
    /// Zero-based position in the anchor chain.
    pub height: u64,
    /// Record hash of the preceding chain record.
    pub previous_hash: String,
    /// Tamper-evident hash of this record.
    pub record_hash: String,
    /// DID of the delegate that performed the write.
    pub delegate: String,
    pub anchored_at: DateTime<Utc>,
}

impl From<AnchorReceipt> for AnchorReceiptResponse {
    fn from(receipt: AnchorReceipt) -> Self {
        Self {
            anchor_id: *receipt.anchor_id.as_uuid(),
            digest: receipt.digest.to_hex(),
            height: receipt.height,
            previous_hash: receipt.previous_hash,
            record_hash: receipt.record_hash,
            delegate: receipt.delegate,
            anchored_at: *receipt.anchored_at.as_datetime(),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the document-hash router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/docHash", post(anchor_doc_hash))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/docHash — Anchor a document hash on the registry ledger.
///
/// The hash must be 64 hex characters (SHA-256). The append either fully
/// chains a new record and returns its receipt, or fails — there is no
/// partial write to retry.
#[utoipa::path(
    post,
    path = "/api/v1/docHash",
    request_body = AnchorHashRequest,
    responses(
        (status = 201, description = "Hash anchored", body = AnchorReceiptResponse),
        (status = 409, description = "Hash already anchored", body = crate::error::ErrorBody),
        (status = 422, description = "Not a valid SHA-256 hex hash", body = crate::error::ErrorBody),
    ),
    tag = "docHash"
)]
pub async fn anchor_doc_hash(
    State(state): State<AppState>,
    body: Result<Json<AnchorHashRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnchorReceiptResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let digest = ContentDigest::from_hex(req.hash.trim())
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let receipt = state.ledger.anchor(digest, &state.issuer_did)?;

    if let Some(pool) = &state.pool {
        crate::db::anchors::insert(pool, &receipt).await?;
    }

    tracing::info!(
        anchor_id = %receipt.anchor_id,
        height = receipt.height,
        "document hash anchored"
    );
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router {
        Router::new().merge(router()).with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn anchor_request(hash: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/docHash")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"hash": hash}).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn anchor_returns_chained_receipt() {
        let state = AppState::new();
        let app = test_app(state.clone());

        let resp = app
            .clone()
            .oneshot(anchor_request(&"ab".repeat(32)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let receipt: AnchorReceiptResponse = body_json(resp).await;
        assert_eq!(receipt.digest, "ab".repeat(32));
        assert_eq!(receipt.height, 0);
        assert_eq!(receipt.previous_hash, "0".repeat(64));
        assert_eq!(receipt.delegate, state.issuer_did);
        assert_eq!(receipt.record_hash.len(), 64);
    }

    #[tokio::test]
    async fn consecutive_anchors_chain() {
        let app = test_app(AppState::new());

        let first = app
            .clone()
            .oneshot(anchor_request(&"ab".repeat(32)))
            .await
            .unwrap();
        let first: AnchorReceiptResponse = body_json(first).await;

        let second = app
            .clone()
            .oneshot(anchor_request(&"cd".repeat(32)))
            .await
            .unwrap();
        let second: AnchorReceiptResponse = body_json(second).await;

        assert_eq!(second.height, 1);
        assert_eq!(second.previous_hash, first.record_hash);
    }

    #[tokio::test]
    async fn duplicate_hash_returns_409() {
        let app = test_app(AppState::new());

        let first = app
            .clone()
            .oneshot(anchor_request(&"ab".repeat(32)))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let first: AnchorReceiptResponse = body_json(first).await;

        let second = app
            .clone()
            .oneshot(anchor_request(&"ab".repeat(32)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let err: crate::error::ErrorBody = body_json(second).await;
        assert_eq!(err.error.code, "CONFLICT");
        assert!(err.error.message.contains(&first.anchor_id.to_string()));
    }

    #[tokio::test]
    async fn uppercase_hash_normalizes() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(anchor_request(&"AB".repeat(32)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let receipt: AnchorReceiptResponse = body_json(resp).await;
        assert_eq!(receipt.digest, "ab".repeat(32));
    }

    #[tokio::test]
    async fn short_hash_returns_422() {
        let app = test_app(AppState::new());
        let resp = app.oneshot(anchor_request("abcd")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn non_hex_hash_returns_422() {
        let app = test_app(AppState::new());
        let resp = app.oneshot(anchor_request(&"zz".repeat(32))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn empty_hash_returns_422() {
        let app = test_app(AppState::new());
        let resp = app.oneshot(anchor_request("")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chain_stays_valid_after_anchors() {
        let state = AppState::new();
        let app = test_app(state.clone());

        for i in 0..4u8 {
            let hash = format!("{i:02x}").repeat(32);
            let resp = app.clone().oneshot(anchor_request(&hash)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let integrity = state.ledger.verify_chain();
        assert_eq!(integrity.total_records, 4);
        assert!(integrity.chain_valid);
    }
}
