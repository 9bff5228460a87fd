//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from attest-vc, attest-schema, and attest-ledger to
//! HTTP status codes and JSON error bodies. Internal error details are
//! never exposed in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses use this format for consistency across the API
/// surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict with current resource state (409) — terminal-state
    /// violations and duplicate anchors land here.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to
    /// the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Schema errors: both a definition that fails to compile and claims that
/// fail validation are client errors (422).
impl From<attest_schema::SchemaError> for AppError {
    fn from(err: attest_schema::SchemaError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Lifecycle errors are terminal-state violations (409).
impl From<attest_vc::LifecycleError> for AppError {
    fn from(err: attest_vc::LifecycleError) -> Self {
        Self::Conflict(err.to_string())
    }
}

/// Ledger errors: a duplicate anchor is a client conflict; an unregistered
/// delegate or chain mismatch means the gateway itself is misconfigured.
impl From<attest_ledger::LedgerError> for AppError {
    fn from(err: attest_ledger::LedgerError) -> Self {
        match &err {
            attest_ledger::LedgerError::DuplicateAnchor { .. } => Self::Conflict(err.to_string()),
            attest_ledger::LedgerError::UnknownDelegate { .. }
            | attest_ledger::LedgerError::ChainMismatch { .. } => Self::Internal(err.to_string()),
        }
    }
}

/// Signing failures during issuance/update are internal, except a
/// canonicalization rejection: the caller's claims carried float values,
/// which the canonical form does not admit (422).
impl From<attest_vc::VcError> for AppError {
    fn from(err: attest_vc::VcError) -> Self {
        match &err {
            attest_vc::VcError::Canonicalization(_) => Self::Validation(format!(
                "claims are not canonicalizable: {err}; use string or integer for numeric values"
            )),
            _ => Self::Internal(format!("credential signing failed: {err}")),
        }
    }
}

/// Database errors are internal.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}
