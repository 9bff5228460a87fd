//! # Credential Lifecycle
//!
//! A credential moves through `active → revoked`, where updates are allowed
//! only while active and revocation is terminal. There is no re-activation
//! path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of an issued credential.
///
/// Serializes as `snake_case` strings for the API contract and the
/// database `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Issued and usable. Updates re-sign the credential in place.
    Active,
    /// Terminally revoked. No further mutation is permitted.
    Revoked,
}

impl CredentialStatus {
    /// String representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }

    /// Guard an update attempt. Fails if the credential is revoked.
    pub fn ensure_updatable(&self) -> Result<(), LifecycleError> {
        match self {
            Self::Active => Ok(()),
            Self::Revoked => Err(LifecycleError::UpdateAfterRevoke),
        }
    }

    /// Perform the one-way transition to `Revoked`.
    ///
    /// Fails if the credential is already revoked — revocation is not
    /// idempotent, so a double revoke surfaces as a conflict to the caller.
    pub fn revoke(&mut self) -> Result<(), LifecycleError> {
        match self {
            Self::Active => {
                *self = Self::Revoked;
                Ok(())
            }
            Self::Revoked => Err(LifecycleError::AlreadyRevoked),
        }
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from lifecycle transitions. Terminal-state violations map to
/// HTTP 409 at the API layer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    /// Attempted to update a revoked credential.
    #[error("credential is revoked; updates are not permitted")]
    UpdateAfterRevoke,

    /// Attempted to revoke an already-revoked credential.
    #[error("credential is already revoked")]
    AlreadyRevoked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_is_updatable() {
        assert!(CredentialStatus::Active.ensure_updatable().is_ok());
    }

    #[test]
    fn revoked_is_not_updatable() {
        assert_eq!(
            CredentialStatus::Revoked.ensure_updatable(),
            Err(LifecycleError::UpdateAfterRevoke)
        );
    }

    #[test]
    fn revoke_transitions_active() {
        let mut status = CredentialStatus::Active;
        status.revoke().unwrap();
        assert_eq!(status, CredentialStatus::Revoked);
    }

    #[test]
    fn double_revoke_is_a_conflict() {
        let mut status = CredentialStatus::Active;
        status.revoke().unwrap();
        assert_eq!(status.revoke(), Err(LifecycleError::AlreadyRevoked));
        assert_eq!(status, CredentialStatus::Revoked);
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&CredentialStatus::Active).unwrap(),
            r#""active""#
        );
        assert_eq!(
            serde_json::to_string(&CredentialStatus::Revoked).unwrap(),
            r#""revoked""#
        );
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", CredentialStatus::Active), "active");
        assert_eq!(format!("{}", CredentialStatus::Revoked), "revoked");
    }
}
