//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/docs` (and `/docs/openapi.json` for tooling that expects a
//! file-shaped path). This replaces the hand-maintained YAML document of
//! the previous gateway generation with a spec generated from the handler
//! types themselves.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attest Credential Gateway",
        version = "0.1.0",
        description = "REST gateway for credential schema registration, verifiable-credential issuance/update/revocation, and document-hash anchoring on the registry ledger.",
        license(name = "Apache-2.0")
    ),
    paths(
        // Schema
        crate::routes::schemas::create_schema,
        crate::routes::schemas::get_schema,
        // Credential
        crate::routes::credentials::issue_credential,
        crate::routes::credentials::get_credential,
        crate::routes::credentials::update_credential,
        crate::routes::credentials::revoke_credential,
        // Document hash
        crate::routes::doc_hash::anchor_doc_hash,
    ),
    components(schemas(
        // State record types
        crate::state::SchemaRecord,
        crate::state::CredentialRecord,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Schema DTOs
        crate::routes::schemas::CreateSchemaRequest,
        crate::routes::schemas::SchemaResponse,
        // Credential DTOs
        crate::routes::credentials::IssueCredentialRequest,
        crate::routes::credentials::UpdateCredentialRequest,
        crate::routes::credentials::RevokeResponse,
        // Document hash DTOs
        crate::routes::doc_hash::AnchorHashRequest,
        crate::routes::doc_hash::AnchorReceiptResponse,
    )),
    tags(
        (name = "schema", description = "Credential schema registry"),
        (name = "credential", description = "Credential issuance and lifecycle"),
        (name = "docHash", description = "Document hash anchoring"),
    )
)]
pub struct ApiDoc;

/// Build the documentation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/docs", get(openapi_json))
        .route("/docs/openapi.json", get(openapi_json))
}

/// GET /docs — Return the generated OpenAPI specification.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_contains_all_declared_paths() {
        let spec = ApiDoc::openapi();
        let paths = &spec.paths.paths;
        assert!(paths.contains_key("/api/v1/schema"));
        assert!(paths.contains_key("/api/v1/schema/{id}"));
        assert!(paths.contains_key("/api/v1/cred"));
        assert!(paths.contains_key("/api/v1/cred/{id}"));
        assert!(paths.contains_key("/api/v1/cred/update/{id}"));
        assert!(paths.contains_key("/api/v1/cred/revoke/{id}"));
        assert!(paths.contains_key("/api/v1/docHash"));
    }

    #[test]
    fn spec_serializes_to_json() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "Attest Credential Gateway");
        assert!(json["components"]["schemas"].get("ErrorBody").is_some());
    }
}
