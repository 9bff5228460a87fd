//! # attest-schema — Claims Validation
//!
//! Runtime JSON Schema validation for credential schemas registered through
//! the gateway. A schema definition is itself validated at registration
//! time (it must compile under draft 2020-12); credential claims are
//! validated against the compiled schema at issuance and on every update.
//!
//! ## Crate Policy
//!
//! - Depends only on `attest-core` internally.
//! - Schema validation is a trust boundary: invalid documents are rejected
//!   with structured errors carrying the instance path, schema path, and a
//!   human-readable message.

pub mod validate;

pub use validate::{
    compile_definition, schema_urn, validate_claims, SchemaError, ValidationViolations, Violation,
};
