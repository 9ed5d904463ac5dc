//! Unit tests for the store-backed session registry

use super::doubles::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_register_lookup_revoke() {
    let fx = fixture();
    let sid = SessionId::generate();

    fx.registry
        .register(TokenKind::Access, sid, UserId(3), HOUR)
        .await
        .unwrap();
    assert_eq!(
        fx.registry.lookup(TokenKind::Access, sid).await.unwrap(),
        Some(UserId(3))
    );
    assert_eq!(
        fx.store.inner.get(&key(TokenKind::Access, sid)).await.unwrap().as_deref(),
        Some("3")
    );

    fx.registry.revoke(TokenKind::Access, sid).await.unwrap();
    assert_eq!(fx.registry.lookup(TokenKind::Access, sid).await.unwrap(), None);

    // Revoking an absent session is not an error.
    fx.registry.revoke(TokenKind::Access, sid).await.unwrap();
}

#[tokio::test]
async fn test_kinds_are_separate_namespaces() {
    let fx = fixture();
    let sid = SessionId::generate();

    fx.registry
        .register(TokenKind::Refresh, sid, UserId(3), HOUR)
        .await
        .unwrap();

    assert_eq!(fx.registry.lookup(TokenKind::Access, sid).await.unwrap(), None);
    assert_eq!(
        fx.registry.lookup(TokenKind::Refresh, sid).await.unwrap(),
        Some(UserId(3))
    );
}

#[tokio::test]
async fn test_consume_returns_owner_once() {
    let fx = fixture();
    let sid = SessionId::generate();
    fx.registry
        .register(TokenKind::Refresh, sid, UserId(9), HOUR)
        .await
        .unwrap();

    assert_eq!(
        fx.registry.consume(TokenKind::Refresh, sid).await.unwrap(),
        Some(UserId(9))
    );
    assert_eq!(fx.registry.consume(TokenKind::Refresh, sid).await.unwrap(), None);
    assert_eq!(fx.registry.lookup(TokenKind::Refresh, sid).await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_record_is_not_found() {
    let fx = fixture();
    let sid = SessionId::generate();
    fx.registry
        .register(TokenKind::Access, sid, UserId(1), Duration::from_millis(20))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(fx.registry.lookup(TokenKind::Access, sid).await.unwrap(), None);
}

#[tokio::test]
async fn test_corrupt_value_is_a_store_error() {
    let fx = fixture();
    let sid = SessionId::generate();
    fx.store
        .inner
        .set(&key(TokenKind::Access, sid), "not-a-user", HOUR)
        .await
        .unwrap();

    assert!(matches!(
        fx.registry.lookup(TokenKind::Access, sid).await,
        Err(StoreError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn test_store_outage_propagates() {
    let fx = fixture();
    fx.store.set_down(true);

    assert!(matches!(
        fx.registry
            .register(TokenKind::Access, SessionId::generate(), UserId(1), HOUR)
            .await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(
        fx.registry
            .lookup(TokenKind::Access, SessionId::generate())
            .await
            .is_err()
    );
}
