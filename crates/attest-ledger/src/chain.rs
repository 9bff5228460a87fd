//! # Anchor Chain — Append-Only Hash-Chained Log
//!
//! Every anchored digest appends an [`AnchorReceipt`] whose `record_hash`
//! is computed over the previous record's hash, forming a tamper-evident
//! chain. The first record chains to a zero hash.
//!
//! Anchoring is write-once per digest: the first writer wins and later
//! attempts surface [`LedgerError::DuplicateAnchor`] carrying the original
//! anchor id.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attest_core::{AnchorId, ContentDigest, Timestamp};

/// Hash the chain starts from (64 zero hex chars).
const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Errors from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The acting identity is not a registered delegate.
    #[error("identity {did} is not a registered delegate")]
    UnknownDelegate {
        /// The DID that attempted the write.
        did: String,
    },

    /// The digest was already anchored; anchoring is write-once.
    #[error("digest {digest} already anchored as {anchor_id}")]
    DuplicateAnchor {
        /// Hex rendering of the duplicate digest.
        digest: String,
        /// The anchor record that holds the digest.
        anchor_id: AnchorId,
    },

    /// A replayed record does not extend the chain.
    #[error("chain mismatch at height {height}: {reason}")]
    ChainMismatch {
        /// Height at which the mismatch occurred.
        height: u64,
        /// Why the record was rejected.
        reason: String,
    },
}

/// A single anchor record — the receipt returned to the caller and the
/// persisted unit of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Unique identifier of this anchor record.
    pub anchor_id: AnchorId,
    /// The anchored content digest.
    pub digest: ContentDigest,
    /// Zero-based position in the chain.
    pub height: u64,
    /// Record hash of the preceding record (zero hash at height 0).
    pub previous_hash: String,
    /// SHA-256 over the chained fields of this record.
    pub record_hash: String,
    /// DID of the delegate that performed the write.
    pub delegate: String,
    /// When the record was appended.
    pub anchored_at: Timestamp,
}

/// Result of a chain integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIntegrity {
    /// Number of records examined.
    pub total_records: usize,
    /// Number of records whose linkage or hash did not verify.
    pub broken_links: usize,
    /// True when every record verified.
    pub chain_valid: bool,
}

#[derive(Default)]
struct LedgerInner {
    records: Vec<AnchorReceipt>,
    by_digest: HashMap<String, AnchorId>,
    delegates: BTreeSet<String>,
}

/// Thread-safe, cloneable handle to the registry ledger.
///
/// The `RwLock` is `parking_lot`, not `tokio::sync` — operations are
/// synchronous and the lock is never held across `.await` points.
#[derive(Clone, Default)]
pub struct RegistryLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

impl RegistryLedger {
    /// Create an empty ledger with no delegates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity as a registry delegate.
    ///
    /// Idempotent: returns `true` if the delegate was newly added, `false`
    /// if it was already registered. Boot-time registration has to survive
    /// process restarts without erroring.
    pub fn register_delegate(&self, did: &str) -> bool {
        self.inner.write().delegates.insert(did.to_string())
    }

    /// Whether the identity is a registered delegate.
    pub fn is_delegate(&self, did: &str) -> bool {
        self.inner.read().delegates.contains(did)
    }

    /// Number of registered delegates.
    pub fn delegate_count(&self) -> usize {
        self.inner.read().delegates.len()
    }

    /// Current chain height (number of records).
    pub fn height(&self) -> u64 {
        self.inner.read().records.len() as u64
    }

    /// Anchor a digest, returning the chained receipt.
    ///
    /// The check-and-append runs under a single write lock, so two
    /// concurrent writers for the same digest cannot both succeed.
    pub fn anchor(&self, digest: ContentDigest, delegate: &str) -> Result<AnchorReceipt, LedgerError> {
        let mut inner = self.inner.write();

        if !inner.delegates.contains(delegate) {
            return Err(LedgerError::UnknownDelegate {
                did: delegate.to_string(),
            });
        }

        let digest_hex = digest.to_hex();
        if let Some(existing) = inner.by_digest.get(&digest_hex) {
            return Err(LedgerError::DuplicateAnchor {
                digest: digest_hex,
                anchor_id: *existing,
            });
        }

        let height = inner.records.len() as u64;
        let previous_hash = inner
            .records
            .last()
            .map(|r| r.record_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let anchored_at = Timestamp::now();
        let anchor_id = AnchorId::new();

        let record_hash = compute_record_hash(
            &previous_hash,
            height,
            &digest_hex,
            delegate,
            &anchored_at,
        );

        let receipt = AnchorReceipt {
            anchor_id,
            digest,
            height,
            previous_hash,
            record_hash,
            delegate: delegate.to_string(),
            anchored_at,
        };

        inner.by_digest.insert(digest_hex, anchor_id);
        inner.records.push(receipt.clone());
        Ok(receipt)
    }

    /// Fetch a record by anchor id.
    pub fn get(&self, id: &AnchorId) -> Option<AnchorReceipt> {
        self.inner
            .read()
            .records
            .iter()
            .find(|r| r.anchor_id == *id)
            .cloned()
    }

    /// Fetch a record by digest hex.
    pub fn find_by_digest(&self, digest_hex: &str) -> Option<AnchorReceipt> {
        let inner = self.inner.read();
        let id = inner.by_digest.get(digest_hex)?;
        inner.records.iter().find(|r| r.anchor_id == *id).cloned()
    }

    /// Replay a persisted record onto the chain during startup hydration.
    ///
    /// The record must extend the chain exactly as it was originally
    /// written: correct height, correct previous-hash linkage, and a
    /// record hash that recomputes from the stored fields. Anything else
    /// is rejected as [`LedgerError::ChainMismatch`] — a corrupted store
    /// must not silently become a valid-looking chain.
    pub fn replay(&self, record: AnchorReceipt) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();

        let expected_height = inner.records.len() as u64;
        if record.height != expected_height {
            return Err(LedgerError::ChainMismatch {
                height: record.height,
                reason: format!("expected height {expected_height}"),
            });
        }

        let expected_prev = inner
            .records
            .last()
            .map(|r| r.record_hash.as_str())
            .unwrap_or(GENESIS_HASH);
        if record.previous_hash != expected_prev {
            return Err(LedgerError::ChainMismatch {
                height: record.height,
                reason: "previous_hash does not match chain tip".to_string(),
            });
        }

        let digest_hex = record.digest.to_hex();
        let recomputed = compute_record_hash(
            &record.previous_hash,
            record.height,
            &digest_hex,
            &record.delegate,
            &record.anchored_at,
        );
        if recomputed != record.record_hash {
            return Err(LedgerError::ChainMismatch {
                height: record.height,
                reason: "record_hash does not recompute from stored fields".to_string(),
            });
        }

        inner.by_digest.insert(digest_hex, record.anchor_id);
        inner.records.push(record);
        Ok(())
    }

    /// Verify the whole chain: linkage and record hashes.
    pub fn verify_chain(&self) -> ChainIntegrity {
        let inner = self.inner.read();
        let mut broken_links = 0;
        let mut expected_prev = GENESIS_HASH.to_string();

        for record in &inner.records {
            let recomputed = compute_record_hash(
                &record.previous_hash,
                record.height,
                &record.digest.to_hex(),
                &record.delegate,
                &record.anchored_at,
            );
            if record.previous_hash != expected_prev || recomputed != record.record_hash {
                broken_links += 1;
            }
            expected_prev = record.record_hash.clone();
        }

        ChainIntegrity {
            total_records: inner.records.len(),
            broken_links,
            chain_valid: broken_links == 0,
        }
    }
}

impl std::fmt::Debug for RegistryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("RegistryLedger")
            .field("height", &inner.records.len())
            .field("delegates", &inner.delegates.len())
            .finish()
    }
}

/// Record hash: SHA-256(previous_hash || height || digest || delegate || anchored_at).
fn compute_record_hash(
    previous_hash: &str,
    height: u64,
    digest_hex: &str,
    delegate: &str,
    anchored_at: &Timestamp,
) -> String {
    use sha2::{Digest, Sha256};
    let input = format!("{previous_hash}{height}{digest_hex}{delegate}{anchored_at}");
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}
