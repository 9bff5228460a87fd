//! # attest-api — HTTP Gateway
//!
//! The HTTP layer of the attest credential gateway, built on Axum/Tokio.
//! Maps the REST surface onto the schema, credential, and anchoring
//! services and assembles shared middleware for tracing and request
//! metrics.
//!
//! ## API Surface
//!
//! | Prefix                     | Module                  | Domain            |
//! |----------------------------|-------------------------|-------------------|
//! | `/api/v1/schema/*`         | [`routes::schemas`]     | Schema registry   |
//! | `/api/v1/cred/*`           | [`routes::credentials`] | Credential lifecycle |
//! | `/api/v1/docHash`          | [`routes::doc_hash`]    | Ledger anchoring  |
//! | `/docs`                    | [`openapi`]             | Generated OpenAPI |
//! | `/health/*`                | this module             | Probes (no state) |
//! | anything else              | this module             | Informational fallback |
//!
//! ## Architecture
//!
//! Request/response types are compile-time contracts via serde derive.
//! OpenAPI specs are generated from handler types via utoipa. No business
//! logic lives in route handlers — they delegate to the domain crates and
//! every error maps to a structured HTTP response via [`AppError`].

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;

pub use error::AppError;
pub use state::AppState;

/// Request bodies are capped at 5 MB, matching the gateway's contract for
/// large schema definitions and claim sets.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the stateful API router
/// so they stay reachable even while the state is busy. Any unmatched path
/// falls through to [`fallback`], which answers 200 with a pointer at the
/// generated documentation.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::schemas::router())
        .merge(routes::credentials::router())
        .merge(routes::doc_hash::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api).fallback(fallback)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}

/// Fallback for unmatched paths.
///
/// Answers 200 with a fixed informational body instead of 404, preserving
/// the gateway's long-standing contract for probing clients.
async fn fallback() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "see /docs for details of the APIs"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn liveness_probe_responds() {
        let app = app(AppState::new());
        let resp = app
            .oneshot(Request::builder().uri("/health/liveness").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_probe_responds() {
        let app = app(AppState::new());
        let resp = app
            .oneshot(Request::builder().uri("/health/readiness").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn fallback_answers_200_with_informational_body() {
        let app = app(AppState::new());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/no/such/path")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].as_str().unwrap().contains("/docs"));
    }
}
