//! # attest-core — Foundational Types
//!
//! Shared building blocks for the attest credential gateway:
//!
//! - [`CanonicalBytes`] — the single construction path for bytes that get
//!   signed or digested. JCS (RFC 8785) output with float rejection.
//! - [`ContentDigest`] — SHA-256 content addressing, computed only from
//!   `CanonicalBytes`.
//! - [`Timestamp`] — UTC-only timestamps truncated to seconds, so the same
//!   instant always canonicalizes to the same bytes.
//! - Identifier newtypes ([`SchemaId`], [`CredentialId`], [`AnchorId`]) that
//!   keep the three identifier namespaces from being confused at the type
//!   level.
//!
//! ## Crate Policy
//!
//! - No dependency on any other workspace crate.
//! - Everything that ends up under a signature flows through
//!   [`CanonicalBytes::new()`]; there is no other way to produce one.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, CoreError, CryptoError};
pub use identity::{AnchorId, CredentialId, SchemaId};
pub use temporal::Timestamp;
