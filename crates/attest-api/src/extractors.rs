//! # Request Extraction & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! JSON bodies with consistent error mapping.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Trait for request types that validate business rules beyond what serde
/// deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to
/// [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Demo {
        name: String,
    }

    impl Validate for Demo {
        fn validate(&self) -> Result<(), String> {
            if self.name.is_empty() {
                return Err("name must not be empty".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn extract_json_passes_through_ok() {
        let result: Result<Json<u32>, JsonRejection> = Ok(Json(7));
        assert_eq!(extract_json(result).unwrap(), 7);
    }

    #[test]
    fn validated_json_rejects_business_rule_violation() {
        let result: Result<Json<Demo>, JsonRejection> = Ok(Json(Demo {
            name: String::new(),
        }));
        match extract_validated_json(result) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("name")),
            other => panic!("expected Validation, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn validated_json_accepts_valid_value() {
        let result: Result<Json<Demo>, JsonRejection> = Ok(Json(Demo {
            name: "ok".to_string(),
        }));
        assert!(extract_validated_json(result).is_ok());
    }
}
