//! # Schema Compilation and Claims Validation
//!
//! Backed by the `jsonschema` crate, draft 2020-12. Registered schema
//! definitions are compiled once to check they are themselves valid JSON
//! Schema documents; claims are validated against the compiled schema with
//! every violation reported, not just the first.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use attest_core::SchemaId;

/// Errors from schema compilation and claims validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema definition is not a valid JSON Schema document.
    #[error("invalid schema definition: {reason}")]
    InvalidDefinition {
        /// Reason the definition failed to compile.
        reason: String,
    },

    /// The claims document failed validation against the schema.
    #[error("claims failed schema validation:\n{violations}")]
    ClaimsRejected {
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the claims document.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// True if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consume self and return the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Render the URN under which a registered schema is referenced from
/// credentials (`credentialSchema.id`).
pub fn schema_urn(id: &SchemaId) -> String {
    format!("urn:attest:schema:{id}")
}

/// Compile a schema definition under draft 2020-12.
///
/// This is the registration-time check: a definition that does not compile
/// is rejected before it is ever stored. The compiled validator is also the
/// engine for [`validate_claims`].
pub fn compile_definition(definition: &Value) -> Result<Validator, SchemaError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.build(definition).map_err(|e| SchemaError::InvalidDefinition {
        reason: e.to_string(),
    })
}

/// Validate a claims document against a schema definition.
///
/// Compiles the definition and collects every violation. Returns
/// `SchemaError::ClaimsRejected` with the full violation list on failure,
/// so API clients see all problems in one response rather than one per
/// round trip.
pub fn validate_claims(definition: &Value, claims: &Value) -> Result<(), SchemaError> {
    let validator = compile_definition(definition)?;

    let violations: Vec<Violation> = validator
        .iter_errors(claims)
        .map(|err| Violation {
            instance_path: err.instance_path.to_string(),
            schema_path: err.schema_path.to_string(),
            message: err.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::ClaimsRejected {
            violations: ValidationViolations { violations },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "minimum": 0}
            },
            "required": ["name"],
            "additionalProperties": false
        })
    }

    #[test]
    fn valid_definition_compiles() {
        assert!(compile_definition(&person_schema()).is_ok());
    }

    #[test]
    fn invalid_definition_rejected() {
        // `type` must be a string or array of strings, not an integer.
        let bad = json!({"type": 12});
        match compile_definition(&bad) {
            Err(SchemaError::InvalidDefinition { reason }) => {
                assert!(!reason.is_empty());
            }
            other => panic!("expected InvalidDefinition, got: {other:?}"),
        }
    }

    #[test]
    fn conforming_claims_accepted() {
        let claims = json!({"name": "Ada", "age": 36});
        validate_claims(&person_schema(), &claims).unwrap();
    }

    #[test]
    fn missing_required_field_rejected() {
        let claims = json!({"age": 36});
        match validate_claims(&person_schema(), &claims) {
            Err(SchemaError::ClaimsRejected { violations }) => {
                assert_eq!(violations.len(), 1);
                assert!(violations.violations()[0].message.contains("name"));
            }
            other => panic!("expected ClaimsRejected, got: {other:?}"),
        }
    }

    #[test]
    fn all_violations_reported() {
        // Wrong type for name AND an additional property: two violations.
        let claims = json!({"name": 7, "pet": "cat"});
        match validate_claims(&person_schema(), &claims) {
            Err(SchemaError::ClaimsRejected { violations }) => {
                assert!(violations.len() >= 2, "got: {violations}");
            }
            other => panic!("expected ClaimsRejected, got: {other:?}"),
        }
    }

    #[test]
    fn violation_carries_instance_path() {
        let claims = json!({"name": "Ada", "age": -1});
        match validate_claims(&person_schema(), &claims) {
            Err(SchemaError::ClaimsRejected { violations }) => {
                let v = &violations.violations()[0];
                assert_eq!(v.instance_path, "/age");
                assert!(!v.schema_path.is_empty());
            }
            other => panic!("expected ClaimsRejected, got: {other:?}"),
        }
    }

    #[test]
    fn empty_schema_accepts_anything() {
        let anything_goes = json!({});
        validate_claims(&anything_goes, &json!({"whatever": [1, 2, 3]})).unwrap();
    }

    #[test]
    fn schema_urn_format() {
        let id = SchemaId::new();
        let urn = schema_urn(&id);
        assert_eq!(urn, format!("urn:attest:schema:{}", id.as_uuid()));
    }

    #[test]
    fn violations_display_lists_each() {
        let claims = json!({"name": 7});
        let err = validate_claims(&person_schema(), &claims).unwrap_err();
        let rendered = format!("{err}");
        assert!(rendered.contains("claims failed schema validation"));
        assert!(rendered.contains("/name"));
    }
}
