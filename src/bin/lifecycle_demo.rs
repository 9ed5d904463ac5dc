//! Walks one session through issue, validate, rotate, replay and logout
//! against the in-memory store.
//!
//! $ cargo run --bin lifecycle_demo

use authgate::application_impl::*;
use authgate::application_port::*;
use authgate::domain_model::*;
use authgate::infra_memory::MemorySessionStore;
use authgate::logger::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();

    let store = Arc::new(MemorySessionStore::new());
    let registry = Arc::new(StoreSessionRegistry::new(store.clone(), "demo"));
    let codec = Arc::new(JwtHs256Codec::new(JwtConfig {
        issuer: "authgate-demo".to_string(),
        audience: "demo-clients".to_string(),
        access_secret: b"demo-access-secret".to_vec(),
        refresh_secret: b"demo-refresh-secret".to_vec(),
    })?);
    let lifecycle = RealTokenLifecycle::new(codec, registry, LifecycleConfig::default());

    let pair = lifecycle.issue(UserId(42)).await?;
    info!(live_sessions = store.len(), "issued {:?}", pair.access_session_id);

    let principal = lifecycle.validate_access(&pair.access_token.0).await?;
    info!(user_id = %principal.user_id, "access token accepted");

    let rotated = lifecycle.rotate(&pair.refresh_token.0).await?;
    info!(live_sessions = store.len(), "rotated into {:?}", rotated.refresh_session_id);

    match lifecycle.rotate(&pair.refresh_token.0).await {
        Err(e) => info!("replayed refresh token rejected: {}", e),
        Ok(_) => warn!("replayed refresh token was accepted"),
    }

    lifecycle
        .revoke(TokenKind::Access, rotated.access_session_id)
        .await?;
    let after_logout = lifecycle.validate_access(&rotated.access_token.0).await;
    info!(rejected = after_logout.is_err(), "access token after revoke");

    Ok(())
}
