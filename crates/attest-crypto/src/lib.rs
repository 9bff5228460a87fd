//! # attest-crypto — Signing Primitives
//!
//! Ed25519 key generation, signing, and verification for credential proofs
//! and ledger delegate identities.
//!
//! ## Crate Policy
//!
//! - Signing input is always `&CanonicalBytes` — raw byte slices cannot be
//!   signed, so nothing non-canonical ever reaches a signature.
//! - Private keys are never serialized or logged.

pub mod ed25519;

pub use ed25519::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
