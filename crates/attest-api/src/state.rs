//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. This replaces the global connection and router
//! singletons of the previous gateway generation with one explicit context
//! object.
//!
//! ## Architecture
//!
//! - **Stores** — thread-safe in-memory maps are the runtime system of
//!   record for schemas and credentials.
//! - **Ledger** — the registry ledger holds anchor records and the
//!   delegate set.
//! - **Pool** — when present, every mutation is mirrored to PostgreSQL and
//!   the stores/ledger are hydrated from it at startup. Tests run without
//!   a pool.
//! - **Issuer** — the gateway's Ed25519 signing identity; its DID is
//!   registered as a registry delegate at boot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_crypto::Ed25519KeyPair;
use attest_ledger::{LedgerError, RegistryLedger};
use attest_vc::{CredentialStatus, VerifiableCredential};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives `&mut T` and may inspect current state,
    /// validate preconditions, mutate, and return `Ok(R)` or `Err(E)`. The
    /// whole operation runs under one write lock, eliminating TOCTOU races
    /// between read and update.
    ///
    /// Returns `None` if the record doesn't exist, `Some(result)` with the
    /// closure's `Result` otherwise.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Record Types -------------------------------------------------------------

/// A registered credential schema.
///
/// Immutable once created: there is no update or delete path, and the
/// identifier is globally unique.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchemaRecord {
    pub id: Uuid,
    /// Human-readable schema name.
    pub name: String,
    /// The JSON Schema document credentials are validated against.
    #[schema(value_type = Object)]
    pub definition: serde_json::Value,
    /// DID of the delegate that registered the schema.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// An issued credential with its lifecycle bookkeeping.
///
/// `credential` is the signed W3C envelope; the surrounding fields track
/// the gateway-side lifecycle (`active → revoked`, version counter).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialRecord {
    pub id: Uuid,
    /// The schema this credential's claims conform to.
    pub schema_id: Uuid,
    /// Lifecycle status; revocation is terminal.
    #[schema(value_type = String)]
    pub status: CredentialStatus,
    /// Starts at 1 on issuance, incremented by every update.
    pub version: i32,
    /// The signed verifiable credential.
    #[schema(value_type = Object)]
    pub credential: VerifiableCredential,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

// -- AppConfig / AppState -----------------------------------------------------

/// Application configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the server binds to.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Errors during startup hydration from the database.
#[derive(Error, Debug)]
pub enum HydrateError {
    /// Database read failed.
    #[error("database error during hydration: {0}")]
    Db(#[from] sqlx::Error),

    /// A persisted anchor record did not replay onto the chain — the
    /// stored chain is corrupt and the gateway must not start.
    #[error("anchor chain replay failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Registered schemas.
    pub schemas: Store<SchemaRecord>,
    /// Issued credentials.
    pub credentials: Store<CredentialRecord>,
    /// Registry ledger: anchor chain + delegate set.
    pub ledger: RegistryLedger,
    /// The gateway's signing identity.
    pub issuer: Arc<Ed25519KeyPair>,
    /// DID derived from the issuer public key.
    pub issuer_did: String,
    /// Database pool; `None` in tests.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Build state with an explicit issuer key and optional database pool.
    ///
    /// Derives the issuer DID from the public key and registers it as a
    /// registry delegate, mirroring the boot-time delegate registration of
    /// the original gateway.
    pub fn with_issuer(config: AppConfig, issuer: Ed25519KeyPair, pool: Option<PgPool>) -> Self {
        let issuer_did = derive_issuer_did(&issuer);
        let ledger = RegistryLedger::new();
        ledger.register_delegate(&issuer_did);

        Self {
            config,
            schemas: Store::new(),
            credentials: Store::new(),
            ledger,
            issuer: Arc::new(issuer),
            issuer_did,
            pool,
        }
    }

    /// Test/dev state: ephemeral issuer key, no database.
    pub fn new() -> Self {
        Self::with_issuer(AppConfig::default(), Ed25519KeyPair::generate(), None)
    }

    /// DID URL of the issuer's active verification method.
    pub fn verification_method(&self) -> String {
        format!("{}#key-1", self.issuer_did)
    }

    /// Hydrate the in-memory stores and the anchor chain from the database.
    ///
    /// No-op without a pool. Anchor records replay in height order; a
    /// record that does not extend the chain aborts startup rather than
    /// letting a corrupted store masquerade as a valid chain.
    pub async fn hydrate_from_db(&self) -> Result<(), HydrateError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        for record in crate::db::schemas::load_all(pool).await? {
            self.schemas.insert(record.id, record);
        }

        for record in crate::db::credentials::load_all(pool).await? {
            self.credentials.insert(record.id, record);
        }

        for receipt in crate::db::anchors::load_all(pool).await? {
            self.ledger.replay(receipt)?;
        }

        tracing::info!(
            schemas = self.schemas.len(),
            credentials = self.credentials.len(),
            anchors = self.ledger.height(),
            "hydrated state from database"
        );
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the gateway's issuer DID from its public key.
fn derive_issuer_did(issuer: &Ed25519KeyPair) -> String {
    format!("did:attest:issuer:{}", issuer.public_key().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_insert_and_get() {
        let store: Store<String> = Store::new();
        let id = Uuid::new_v4();
        assert!(store.insert(id, "a".to_string()).is_none());
        assert_eq!(store.get(&id), Some("a".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_insert_returns_previous() {
        let store: Store<u32> = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, 1);
        assert_eq!(store.insert(id, 2), Some(1));
        assert_eq!(store.get(&id), Some(2));
    }

    #[test]
    fn store_try_update_missing_returns_none() {
        let store: Store<u32> = Store::new();
        let result = store.try_update(&Uuid::new_v4(), |v| {
            *v += 1;
            Ok::<u32, ()>(*v)
        });
        assert!(result.is_none());
    }

    #[test]
    fn store_try_update_propagates_closure_result() {
        let store: Store<u32> = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, 10);

        let err = store
            .try_update(&id, |v| {
                if *v >= 10 {
                    Err("too big")
                } else {
                    *v += 1;
                    Ok(*v)
                }
            })
            .unwrap();
        assert_eq!(err, Err("too big"));
        // Failed validation must not have mutated.
        assert_eq!(store.get(&id), Some(10));
    }

    #[test]
    fn store_clones_share_data() {
        let store: Store<u32> = Store::new();
        let clone = store.clone();
        let id = Uuid::new_v4();
        store.insert(id, 5);
        assert_eq!(clone.get(&id), Some(5));
    }

    #[test]
    fn state_registers_issuer_as_delegate() {
        let state = AppState::new();
        assert!(state.ledger.is_delegate(&state.issuer_did));
        assert_eq!(state.ledger.delegate_count(), 1);
    }

    #[test]
    fn issuer_did_derives_from_public_key() {
        let state = AppState::new();
        assert!(state
            .issuer_did
            .starts_with("did:attest:issuer:"));
        assert!(state.issuer_did.ends_with(&state.issuer.public_key().to_hex()));
    }

    #[test]
    fn verification_method_has_key_fragment() {
        let state = AppState::new();
        assert_eq!(
            state.verification_method(),
            format!("{}#key-1", state.issuer_did)
        );
    }

    #[tokio::test]
    async fn hydrate_without_pool_is_noop() {
        let state = AppState::new();
        state.hydrate_from_db().await.unwrap();
        assert!(state.schemas.is_empty());
    }
}
