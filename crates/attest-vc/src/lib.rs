//! # attest-vc — Verifiable Credentials
//!
//! The W3C VC envelope issued by the gateway, its proof objects, and the
//! credential lifecycle state machine.
//!
//! ## Module Map
//!
//! - [`credential`] — [`VerifiableCredential`] structure, signing input
//!   computation, Ed25519 proof attachment and verification.
//! - [`proof`] — [`Proof`] object with W3C field names and proof purposes.
//! - [`status`] — [`CredentialStatus`] and the one-way revocation guard.
//!
//! ## Crate Policy
//!
//! - The envelope structure is rigid; `credentialSubject` is intentionally
//!   extensible per the W3C specification.
//! - Signing and verification go through `CanonicalBytes` only.

pub mod credential;
pub mod proof;
pub mod status;

pub use credential::{
    ContextValue, CredentialSchemaRef, CredentialTypeValue, ProofResult, ProofValue, VcError,
    VerifiableCredential,
};
pub use proof::{Proof, ProofPurpose, ProofType};
pub use status::{CredentialStatus, LifecycleError};
