//! # Verifiable Credential Structure, Signing, and Verification
//!
//! Defines the core [`VerifiableCredential`] type following the W3C VC Data
//! Model, as issued by the gateway.
//!
//! ## Security Invariants
//!
//! - **Signing** canonicalizes the credential body (with `proof` removed)
//!   via [`CanonicalBytes`], computes an Ed25519 signature, and attaches a
//!   [`Proof`] object. No raw `serde_json::to_vec()` in the signing path.
//! - **Verification** recomputes the canonical signing input from the body
//!   without proof and checks each attached signature.
//! - The envelope structure is rigid, while `credential_subject` is
//!   intentionally extensible per the W3C specification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attest_core::{CanonicalBytes, Timestamp};
use attest_crypto::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

use crate::proof::{Proof, ProofPurpose, ProofType};

/// Errors from VC signing and verification operations.
#[derive(Error, Debug)]
pub enum VcError {
    /// Canonicalization of the credential body failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] attest_core::CanonicalizationError),

    /// Ed25519 signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// The credential has no proofs to verify.
    #[error("credential has no proofs")]
    NoProofs,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The proof value has invalid hex encoding or wrong length.
    #[error("invalid proof value: {0}")]
    InvalidProofValue(String),
}

/// The result of verifying a single proof on a credential.
#[derive(Debug, Clone)]
pub struct ProofResult {
    /// The verification method (DID URL) from the proof.
    pub verification_method: String,
    /// Whether the signature was valid.
    pub ok: bool,
    /// Error message if verification failed; empty string if ok.
    pub error: String,
}

/// Reference from a credential to the schema its claims conform to.
///
/// Serialized as the W3C `credentialSchema` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchemaRef {
    /// Schema identifier (URN).
    pub id: String,
    /// Schema language tag; always `"JsonSchema"` for this gateway.
    #[serde(rename = "type")]
    pub schema_type: String,
}

impl CredentialSchemaRef {
    /// Build a JSON Schema reference from a schema URN.
    pub fn json_schema(id: String) -> Self {
        Self {
            id,
            schema_type: "JsonSchema".to_string(),
        }
    }
}

/// A W3C Verifiable Credential.
///
/// ## Field Naming
///
/// Serde rename attributes map between Rust snake_case and the W3C VC JSON
/// field names (camelCase / `@`-prefixed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifiableCredential {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    pub context: ContextValue,

    /// Credential identifier (URN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Credential type(s). MUST include `"VerifiableCredential"`.
    #[serde(rename = "type")]
    pub credential_type: CredentialTypeValue,

    /// DID of the credential issuer.
    pub issuer: String,

    /// When the credential was issued (UTC).
    #[serde(rename = "issuanceDate")]
    pub issuance_date: DateTime<Utc>,

    /// Optional expiration date (UTC).
    #[serde(
        rename = "expirationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Reference to the schema the claims conform to.
    #[serde(
        rename = "credentialSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_schema: Option<CredentialSchemaRef>,

    /// The credential subject — intentionally extensible per W3C spec.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: serde_json::Value,

    /// Cryptographic proofs attached to this credential.
    #[serde(default, skip_serializing_if = "ProofValue::is_empty")]
    pub proof: ProofValue,
}

/// JSON-LD `@context` value — either a single string or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    /// Single context URI string.
    Single(String),
    /// Array of context URI strings or objects.
    Array(Vec<serde_json::Value>),
}

impl Default for ContextValue {
    fn default() -> Self {
        Self::Array(vec![serde_json::Value::String(
            "https://www.w3.org/2018/credentials/v1".to_string(),
        )])
    }
}

/// Credential `type` value — either a single string or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialTypeValue {
    /// Single type string.
    Single(String),
    /// Array of type strings.
    Array(Vec<String>),
}

impl CredentialTypeValue {
    /// Check whether `"VerifiableCredential"` is included in the type.
    pub fn contains_vc_type(&self) -> bool {
        match self {
            CredentialTypeValue::Single(s) => s == "VerifiableCredential",
            CredentialTypeValue::Array(arr) => arr.iter().any(|s| s == "VerifiableCredential"),
        }
    }
}

/// Proof value — supports a single proof object, an array of proofs, or
/// absent. Handles the JSON polymorphism at the serde level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofValue {
    /// A single proof object.
    Single(Box<Proof>),
    /// An array of proof objects.
    Array(Vec<Proof>),
}

impl Default for ProofValue {
    fn default() -> Self {
        Self::Array(Vec::new())
    }
}

impl ProofValue {
    /// Returns `true` if there are no proofs.
    pub fn is_empty(&self) -> bool {
        match self {
            ProofValue::Single(_) => false,
            ProofValue::Array(arr) => arr.is_empty(),
        }
    }

    /// Normalize to a list of proof references.
    pub fn as_list(&self) -> Vec<&Proof> {
        match self {
            ProofValue::Single(p) => vec![p.as_ref()],
            ProofValue::Array(arr) => arr.iter().collect(),
        }
    }

    /// Add a proof, converting Single to Array if needed.
    pub fn push(&mut self, proof: Proof) {
        match self {
            ProofValue::Single(existing) => {
                let prev = existing.clone();
                *self = ProofValue::Array(vec![*prev, proof]);
            }
            ProofValue::Array(arr) => {
                arr.push(proof);
            }
        }
    }

    /// Drop all proofs. Used before re-signing an updated credential body.
    pub fn clear(&mut self) {
        *self = ProofValue::Array(Vec::new());
    }
}

impl VerifiableCredential {
    /// Compute the canonical signing input for this credential.
    ///
    /// The signing input is the JCS-canonicalized bytes of the credential
    /// with the `proof` field removed.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut val = serde_json::to_value(self)?;
        if let Some(obj) = val.as_object_mut() {
            obj.remove("proof");
        }
        Ok(CanonicalBytes::from_value(val)?)
    }

    /// Sign this credential with an Ed25519 key pair.
    ///
    /// Computes the canonical signing input, signs it, and attaches the
    /// proof object.
    pub fn sign_ed25519(
        &mut self,
        key_pair: &Ed25519KeyPair,
        verification_method: String,
        created: Option<Timestamp>,
    ) -> Result<(), VcError> {
        let canonical = self.signing_input()?;
        let signature = key_pair.sign(&canonical);

        let proof = Proof {
            proof_type: ProofType::Ed25519Signature2020,
            created: *created.unwrap_or_else(Timestamp::now).as_datetime(),
            verification_method,
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value: signature.to_hex(),
        };

        self.proof.push(proof);
        Ok(())
    }

    /// Verify all proofs on this credential.
    ///
    /// Returns a [`ProofResult`] for each proof. An expired credential
    /// yields all-failed results without spending CPU on signature checks.
    /// A credential with zero proofs returns an empty `Vec`, which callers
    /// must treat as verification failure, not vacuous success.
    ///
    /// # Arguments
    ///
    /// * `resolve_key` — resolves a verification method string to an
    ///   [`Ed25519PublicKey`].
    pub fn verify<F>(&self, resolve_key: F) -> Vec<ProofResult>
    where
        F: Fn(&str) -> Result<Ed25519PublicKey, String>,
    {
        if let Some(expiration) = self.expiration_date {
            if expiration < Utc::now() {
                return self
                    .proof
                    .as_list()
                    .iter()
                    .map(|p| ProofResult {
                        verification_method: p.verification_method.clone(),
                        ok: false,
                        error: format!("credential expired at {expiration}"),
                    })
                    .collect();
            }
        }

        let canonical = match self.signing_input() {
            Ok(c) => c,
            Err(e) => {
                return self
                    .proof
                    .as_list()
                    .iter()
                    .map(|p| ProofResult {
                        verification_method: p.verification_method.clone(),
                        ok: false,
                        error: format!("canonicalization failed: {e}"),
                    })
                    .collect();
            }
        };

        self.proof
            .as_list()
            .iter()
            .map(|proof| {
                let vm = proof.verification_method.clone();
                match verify_single_proof(proof, &canonical, &resolve_key) {
                    Ok(()) => ProofResult {
                        verification_method: vm,
                        ok: true,
                        error: String::new(),
                    },
                    Err(e) => ProofResult {
                        verification_method: vm,
                        ok: false,
                        error: e.to_string(),
                    },
                }
            })
            .collect()
    }

    /// Verify all proofs and return `Ok(())` only if all pass.
    ///
    /// A credential with zero proofs fails with [`VcError::NoProofs`]; an
    /// expired credential fails regardless of signature validity.
    pub fn verify_all<F>(&self, resolve_key: F) -> Result<(), VcError>
    where
        F: Fn(&str) -> Result<Ed25519PublicKey, String>,
    {
        if let Some(expiration) = self.expiration_date {
            if expiration < Utc::now() {
                return Err(VcError::VerificationFailed(format!(
                    "credential expired at {expiration}"
                )));
            }
        }

        let results = self.verify(resolve_key);
        if results.is_empty() {
            return Err(VcError::NoProofs);
        }
        for r in &results {
            if !r.ok {
                return Err(VcError::VerificationFailed(format!(
                    "proof from {} failed: {}",
                    r.verification_method, r.error
                )));
            }
        }
        Ok(())
    }
}

/// Verify a single proof against the canonical signing input.
fn verify_single_proof<F>(
    proof: &Proof,
    canonical: &CanonicalBytes,
    resolve_key: &F,
) -> Result<(), VcError>
where
    F: Fn(&str) -> Result<Ed25519PublicKey, String>,
{
    let pk = resolve_key(&proof.verification_method).map_err(VcError::VerificationFailed)?;

    let sig = Ed25519Signature::from_hex(&proof.proof_value).map_err(|e| {
        VcError::InvalidProofValue(format!("failed to decode proof value as hex: {e}"))
    })?;

    verify_with_public_key(canonical, &sig, &pk)
        .map_err(|e| VcError::VerificationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_test_vc() -> VerifiableCredential {
        VerifiableCredential {
            context: ContextValue::default(),
            id: Some("urn:attest:cred:test-001".to_string()),
            credential_type: CredentialTypeValue::Array(vec![
                "VerifiableCredential".to_string(),
                "AttestGatewayCredential".to_string(),
            ]),
            issuer: "did:attest:issuer:test".to_string(),
            issuance_date: chrono::Utc::now(),
            expiration_date: None,
            credential_schema: Some(CredentialSchemaRef::json_schema(
                "urn:attest:schema:test-001".to_string(),
            )),
            credential_subject: json!({
                "name": "Ada Lovelace",
                "degree": "Mathematics"
            }),
            proof: ProofValue::default(),
        }
    }

    fn make_key_resolver(pk: Ed25519PublicKey) -> impl Fn(&str) -> Result<Ed25519PublicKey, String> {
        move |_vm: &str| Ok(pk.clone())
    }

    #[test]
    fn signing_input_excludes_proof() {
        let mut vc = make_test_vc();
        let before = vc.signing_input().unwrap();

        vc.proof = ProofValue::Single(Box::new(Proof::new_ed25519(
            "did:attest:fake#key-1".to_string(),
            "00".repeat(64),
            None,
        )));

        let after = vc.signing_input().unwrap();
        assert_eq!(before.as_bytes(), after.as_bytes());
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        assert!(!vc.proof.is_empty());
        let results = vc.verify(make_key_resolver(kp.public_key()));
        assert_eq!(results.len(), 1);
        assert!(results[0].ok, "verification failed: {}", results[0].error);
    }

    #[test]
    fn verification_fails_with_wrong_key() {
        let kp = Ed25519KeyPair::generate();
        let other = Ed25519KeyPair::generate();

        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        let results = vc.verify(make_key_resolver(other.public_key()));
        assert_eq!(results.len(), 1);
        assert!(!results[0].ok);
    }

    #[test]
    fn verification_fails_with_tampered_subject() {
        let kp = Ed25519KeyPair::generate();
        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        vc.credential_subject = json!({"name": "Mallory", "degree": "Mathematics"});

        let results = vc.verify(make_key_resolver(kp.public_key()));
        assert_eq!(results.len(), 1);
        assert!(!results[0].ok);
    }

    #[test]
    fn resign_after_clear_produces_fresh_proof() {
        let kp = Ed25519KeyPair::generate();
        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        vc.credential_subject = json!({"name": "Ada Lovelace", "degree": "Analysis"});
        vc.proof.clear();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        assert_eq!(vc.proof.as_list().len(), 1);
        let results = vc.verify(make_key_resolver(kp.public_key()));
        assert!(results[0].ok, "re-signed credential should verify");
    }

    #[test]
    fn verify_all_returns_error_on_no_proofs() {
        let vc = make_test_vc();
        let result = vc.verify_all(|_| Err("no key".to_string()));
        assert!(matches!(result, Err(VcError::NoProofs)));
    }

    #[test]
    fn verify_all_returns_error_on_bad_signature() {
        let kp = Ed25519KeyPair::generate();
        let other = Ed25519KeyPair::generate();

        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        assert!(vc.verify_all(make_key_resolver(other.public_key())).is_err());
    }

    #[test]
    fn expired_credential_fails_verification() {
        let kp = Ed25519KeyPair::generate();
        let mut vc = make_test_vc();
        vc.expiration_date = Some(chrono::Utc::now() - chrono::Duration::days(1));
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        let results = vc.verify(make_key_resolver(kp.public_key()));
        assert!(!results[0].ok);
        assert!(results[0].error.contains("expired"));
    }

    #[test]
    fn vc_json_field_names_match_w3c() {
        let vc = make_test_vc();
        let val = serde_json::to_value(&vc).unwrap();

        assert!(val.get("@context").is_some());
        assert!(val.get("type").is_some());
        assert!(val.get("issuanceDate").is_some());
        assert!(val.get("credentialSubject").is_some());
        assert!(val.get("credentialSchema").is_some());
        assert!(val.get("credential_type").is_none());
        assert!(val.get("issuance_date").is_none());
    }

    #[test]
    fn credential_schema_ref_serializes_with_type_field() {
        let vc = make_test_vc();
        let val = serde_json::to_value(&vc).unwrap();
        assert_eq!(val["credentialSchema"]["type"], "JsonSchema");
        assert_eq!(val["credentialSchema"]["id"], "urn:attest:schema:test-001");
    }

    #[test]
    fn vc_serde_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp, "did:attest:issuer:test#key-1".to_string(), None)
            .unwrap();

        let json_str = serde_json::to_string_pretty(&vc).unwrap();
        let vc2: VerifiableCredential = serde_json::from_str(&json_str).unwrap();

        assert_eq!(vc.issuer, vc2.issuer);
        assert_eq!(vc.credential_schema, vc2.credential_schema);
        assert_eq!(vc.proof.as_list().len(), vc2.proof.as_list().len());
    }

    #[test]
    fn unknown_envelope_fields_rejected() {
        let json_str = r#"{
            "@context": "https://www.w3.org/2018/credentials/v1",
            "type": "VerifiableCredential",
            "issuer": "did:attest:issuer:test",
            "issuanceDate": "2026-01-15T12:00:00Z",
            "credentialSubject": {},
            "sneaky": true
        }"#;
        let result: Result<VerifiableCredential, _> = serde_json::from_str(json_str);
        assert!(result.is_err());
    }

    #[test]
    fn signing_input_rejects_float_in_subject() {
        let mut vc = make_test_vc();
        vc.credential_subject = json!({"amount": 3.15});
        assert!(vc.signing_input().is_err());
    }

    #[test]
    fn signing_input_is_deterministic() {
        let vc = make_test_vc();
        let a = vc.signing_input().unwrap();
        let b = vc.signing_input().unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn multi_party_signing() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let pk1 = kp1.public_key();
        let pk2 = kp2.public_key();

        let mut vc = make_test_vc();
        vc.sign_ed25519(&kp1, "did:attest:signer-1#key-1".to_string(), None)
            .unwrap();
        vc.sign_ed25519(&kp2, "did:attest:signer-2#key-1".to_string(), None)
            .unwrap();

        assert_eq!(vc.proof.as_list().len(), 2);

        let results = vc.verify(move |vm: &str| {
            if vm.contains("signer-1") {
                Ok(pk1.clone())
            } else if vm.contains("signer-2") {
                Ok(pk2.clone())
            } else {
                Err(format!("unknown verification method: {vm}"))
            }
        });

        assert_eq!(results.len(), 2);
        assert!(results[0].ok, "signer-1 failed: {}", results[0].error);
        assert!(results[1].ok, "signer-2 failed: {}", results[1].error);
    }

    #[test]
    fn credential_type_contains_vc_type() {
        assert!(CredentialTypeValue::Single("VerifiableCredential".into()).contains_vc_type());
        assert!(CredentialTypeValue::Array(vec![
            "VerifiableCredential".into(),
            "Custom".into()
        ])
        .contains_vc_type());
        assert!(!CredentialTypeValue::Array(vec!["Custom".into()]).contains_vc_type());
    }

    #[test]
    fn proof_value_push_converts_single_to_array() {
        let p1 = Proof::new_ed25519("vm1".to_string(), "aa".repeat(64), None);
        let p2 = Proof::new_ed25519("vm2".to_string(), "bb".repeat(64), None);

        let mut pv = ProofValue::Single(Box::new(p1));
        assert_eq!(pv.as_list().len(), 1);
        pv.push(p2);
        assert_eq!(pv.as_list().len(), 2);
    }

    #[test]
    fn invalid_proof_hex_reports_error() {
        let kp = Ed25519KeyPair::generate();
        let mut vc = make_test_vc();
        vc.proof = ProofValue::Single(Box::new(Proof::new_ed25519(
            "did:attest:issuer:test#key-1".to_string(),
            "not-hex".to_string(),
            None,
        )));

        let results = vc.verify(make_key_resolver(kp.public_key()));
        assert_eq!(results.len(), 1);
        assert!(!results[0].ok);
        assert!(results[0].error.contains("proof value"));
    }
}
