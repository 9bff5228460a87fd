//! # Proof Types for Verifiable Credentials
//!
//! The cryptographic proof structure attached to VCs. The proof object has
//! rigid structure to prevent injection of unexpected fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attest_core::Timestamp;

/// The type of cryptographic proof attached to a VC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// Ed25519 digital signature per W3C VC Data Integrity.
    Ed25519Signature2020,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofType::Ed25519Signature2020 => write!(f, "Ed25519Signature2020"),
        }
    }
}

/// The purpose of a cryptographic proof, per the W3C proof purpose
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims are true.
    AssertionMethod,
    /// Authentication of the credential holder.
    Authentication,
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofPurpose::AssertionMethod => write!(f, "assertionMethod"),
            ProofPurpose::Authentication => write!(f, "authentication"),
        }
    }
}

/// A cryptographic proof on a Verifiable Credential.
///
/// ## Security Invariant
///
/// `proof_value` contains hex-encoded signature bytes computed over the
/// JCS-canonicalized credential body with the `proof` field excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// The proof type.
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// When the proof was created (UTC, truncated to seconds).
    pub created: DateTime<Utc>,

    /// The verification method — a DID URL identifying the signing key.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    /// The purpose of this proof.
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// The proof value — hex-encoded signature bytes (128 hex chars for
    /// Ed25519).
    #[serde(rename = "proofValue")]
    pub proof_value: String,
}

impl Proof {
    /// Create a new Ed25519Signature2020 proof.
    ///
    /// `created` defaults to the current UTC time when `None`.
    pub fn new_ed25519(
        verification_method: String,
        proof_value: String,
        created: Option<Timestamp>,
    ) -> Self {
        let ts = created.unwrap_or_else(Timestamp::now);
        Self {
            proof_type: ProofType::Ed25519Signature2020,
            created: *ts.as_datetime(),
            verification_method,
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value,
        }
    }
}
