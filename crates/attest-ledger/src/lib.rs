//! # attest-ledger — Registry Ledger
//!
//! The distributed-ledger seam of the gateway, realized as an in-process
//! append-only log. Each anchored document hash becomes an
//! [`AnchorReceipt`] whose record hash chains to the previous record,
//! forming a tamper-evident sequence that can be integrity-checked at any
//! time.
//!
//! Writes are gated on the registry delegate set: only an identity that was
//! registered as a delegate (the gateway registers its own issuer DID at
//! boot) may anchor.
//!
//! ## Crate Policy
//!
//! - Depends only on `attest-core` internally.
//! - Appends are atomic: a receipt is either fully chained into the log or
//!   the call fails. There is no partial write to retry.

pub mod chain;

pub use chain::{AnchorReceipt, ChainIntegrity, LedgerError, RegistryLedger};
