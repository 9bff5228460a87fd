//! # attest-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the attest credential gateway.
//!
//! Startup is deliberately strict: a missing or unreachable database, a
//! malformed issuer key, or a failed delegate registration aborts the
//! process rather than serving in a half-configured state.

use anyhow::Context;

use attest_api::state::{AppConfig, AppState};
use attest_crypto::Ed25519KeyPair;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let config = AppConfig { port };

    // The database is required: fail loudly if it is absent or unreachable.
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set; the gateway does not start without its database")?;
    let pool = attest_api::db::init_pool(&database_url).await.map_err(|e| {
        tracing::error!(error = %e, "database connection failed");
        anyhow::anyhow!("database connection failed: {e}")
    })?;
    attest_api::db::ensure_schema(&pool)
        .await
        .context("failed to ensure database schema")?;

    // Issuer identity: from a pinned seed, or ephemeral for development.
    let issuer = load_issuer_key()?;

    // Bootstrap registers the issuer DID as a registry delegate.
    let state = AppState::with_issuer(config, issuer, Some(pool));
    tracing::info!(issuer_did = %state.issuer_did, "issuer registered as registry delegate");

    // Hydrate in-memory stores and replay the anchor chain.
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!(error = %e, "database hydration failed");
        anyhow::anyhow!("database hydration failed: {e}")
    })?;

    let port = state.config.port;
    let app = attest_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("attest gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load the issuer signing key.
///
/// `ISSUER_SIGNING_KEY_HEX` pins the key across restarts (64 hex chars =
/// 32-byte seed). Without it an ephemeral key is generated and a warning
/// is logged — previously issued credentials will no longer verify against
/// the new key.
fn load_issuer_key() -> anyhow::Result<Ed25519KeyPair> {
    match std::env::var("ISSUER_SIGNING_KEY_HEX") {
        Ok(hex) => {
            let bytes = decode_hex(hex.trim())
                .map_err(|e| anyhow::anyhow!("invalid hex in ISSUER_SIGNING_KEY_HEX: {e}"))?;
            let seed: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
                anyhow::anyhow!(
                    "ISSUER_SIGNING_KEY_HEX must decode to 32 bytes, got {}",
                    v.len()
                )
            })?;
            Ok(Ed25519KeyPair::from_seed(&seed))
        }
        Err(_) => {
            tracing::warn!(
                "ISSUER_SIGNING_KEY_HEX not set — generating an ephemeral issuer key; \
                 credentials issued before a restart will not verify afterwards"
            );
            Ok(Ed25519KeyPair::generate())
        }
    }
}

/// Decode a hex string into bytes.
fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("hex string has odd length: {}", s.len()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}
