//! Unit tests for the token lifecycle

use super::doubles::*;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
const SEVEN_DAYS: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn assert_ttl_near(actual: Option<Duration>, expected: Duration) {
    let actual = actual.expect("session record present");
    assert!(actual <= expected, "{:?} > {:?}", actual, expected);
    assert!(
        actual + Duration::from_secs(3) > expected,
        "{:?} too far below {:?}",
        actual,
        expected
    );
}

#[tokio::test]
async fn test_issue_then_validate_access() {
    let fx = fixture();

    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();
    let principal = fx
        .lifecycle
        .validate_access(&pair.access_token.0)
        .await
        .unwrap();

    assert_eq!(principal.user_id, UserId(7));
    assert_eq!(principal.session_id, pair.access_session_id);
}

#[tokio::test]
async fn test_issue_registers_both_sessions_with_token_lifetimes() {
    let fx = fixture();

    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();

    assert_eq!(fx.store.set_calls(), 2);
    assert_eq!(fx.store.inner.len(), 2);
    assert_ne!(pair.access_session_id, pair.refresh_session_id);
    assert!(pair.access_expires_at < pair.refresh_expires_at);
    assert_ttl_near(
        fx.store
            .inner
            .ttl(&key(TokenKind::Access, pair.access_session_id)),
        FIFTEEN_MINUTES,
    );
    assert_ttl_near(
        fx.store
            .inner
            .ttl(&key(TokenKind::Refresh, pair.refresh_session_id)),
        SEVEN_DAYS,
    );
    assert_eq!(
        fx.registry
            .lookup(TokenKind::Refresh, pair.refresh_session_id)
            .await
            .unwrap(),
        Some(UserId(7))
    );
}

#[tokio::test]
async fn test_issued_expiry_matches_claims() {
    let fx = fixture();

    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();
    let access = fx
        .codec
        .parse(TokenKind::Access, &pair.access_token.0)
        .unwrap();
    let refresh = fx
        .codec
        .parse(TokenKind::Refresh, &pair.refresh_token.0)
        .unwrap();

    assert_eq!(access.expires_at(), Some(pair.access_expires_at));
    assert_eq!(refresh.expires_at(), Some(pair.refresh_expires_at));
    assert_eq!(access.sid, pair.access_session_id);
    assert_eq!(refresh.sid, pair.refresh_session_id);
}

#[tokio::test]
async fn test_revoked_access_token_is_rejected() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();

    fx.lifecycle
        .revoke(TokenKind::Access, pair.access_session_id)
        .await
        .unwrap();

    // Still cryptographically valid, but the session is gone.
    assert!(fx.codec.parse(TokenKind::Access, &pair.access_token.0).is_ok());
    assert!(matches!(
        fx.lifecycle.validate_access(&pair.access_token.0).await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_revoke_absent_session_is_noop() {
    let fx = fixture();
    fx.lifecycle
        .revoke(TokenKind::Refresh, SessionId::generate())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rotate_is_single_use() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();

    fx.lifecycle.rotate(&pair.refresh_token.0).await.unwrap();
    let sets_after_rotation = fx.store.set_calls();
    let live_after_rotation = fx.store.inner.len();

    assert!(matches!(
        fx.lifecycle.rotate(&pair.refresh_token.0).await,
        Err(AuthError::Unauthenticated)
    ));
    assert_eq!(fx.store.set_calls(), sets_after_rotation);
    assert_eq!(fx.store.inner.len(), live_after_rotation);
}

#[tokio::test]
async fn test_rotate_creates_new_sessions() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();

    let rotated = fx.lifecycle.rotate(&pair.refresh_token.0).await.unwrap();

    assert_ne!(rotated.access_session_id, pair.access_session_id);
    assert_ne!(rotated.refresh_session_id, pair.refresh_session_id);
    assert_ne!(rotated.refresh_session_id, rotated.access_session_id);
    assert_eq!(
        fx.lifecycle
            .validate_access(&rotated.access_token.0)
            .await
            .unwrap()
            .user_id,
        UserId(7)
    );
    assert_eq!(
        fx.registry
            .lookup(TokenKind::Refresh, pair.refresh_session_id)
            .await
            .unwrap(),
        None
    );
    assert!(matches!(
        fx.lifecycle.validate_refresh(&pair.refresh_token.0).await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_rotated_refresh_token_can_rotate_again() {
    let fx = fixture();
    let first = fx.lifecycle.issue(UserId(7)).await.unwrap();

    let second = fx.lifecycle.rotate(&first.refresh_token.0).await.unwrap();
    let third = fx.lifecycle.rotate(&second.refresh_token.0).await.unwrap();

    assert_ne!(third.refresh_session_id, second.refresh_session_id);
}

#[tokio::test]
async fn test_tokens_are_not_interchangeable() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();

    assert!(matches!(
        fx.lifecycle.rotate(&pair.access_token.0).await,
        Err(AuthError::Unauthenticated)
    ));
    assert!(matches!(
        fx.lifecycle.validate_access(&pair.refresh_token.0).await,
        Err(AuthError::Unauthenticated)
    ));
    // The failed rotation must not have touched the real refresh session.
    assert!(fx.lifecycle.rotate(&pair.refresh_token.0).await.is_ok());
}

#[tokio::test]
async fn test_expired_token_rejected_despite_live_session() {
    let fx = fixture();
    let session_id = SessionId::generate();
    let token = fx
        .codec
        .mint(
            TokenKind::Access,
            UserId(7),
            session_id,
            Utc::now() - chrono::Duration::seconds(10),
        )
        .unwrap();
    fx.registry
        .register(TokenKind::Access, session_id, UserId(7), Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(
        fx.codec.parse(TokenKind::Access, &token),
        Err(CodecError::Expired)
    );
    assert!(matches!(
        fx.lifecycle.validate_access(&token).await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_session_owner_mismatch_rejected() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();
    fx.registry
        .register(
            TokenKind::Access,
            pair.access_session_id,
            UserId(8),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    assert!(matches!(
        fx.lifecycle.validate_access(&pair.access_token.0).await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_validate_refresh_has_no_side_effect() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();

    for _ in 0..2 {
        let principal = fx
            .lifecycle
            .validate_refresh(&pair.refresh_token.0)
            .await
            .unwrap();
        assert_eq!(principal.session_id, pair.refresh_session_id);
    }
    assert!(fx.lifecycle.rotate(&pair.refresh_token.0).await.is_ok());
}

#[tokio::test]
async fn test_issue_rolls_back_access_session_on_partial_failure() {
    let fx = fixture_with(ScriptedStore::failing_set(2));

    assert!(matches!(
        fx.lifecycle.issue(UserId(7)).await,
        Err(AuthError::Issuance(_))
    ));
    assert_eq!(fx.store.set_calls(), 2);
    assert!(fx.store.inner.is_empty());
}

#[tokio::test]
async fn test_issue_fails_when_store_down() {
    let fx = fixture();
    fx.store.set_down(true);

    assert!(matches!(
        fx.lifecycle.issue(UserId(7)).await,
        Err(AuthError::Issuance(_))
    ));
    assert!(fx.store.inner.is_empty());
}

#[tokio::test]
async fn test_store_outage_is_store_unavailable() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();
    fx.store.set_down(true);

    assert!(matches!(
        fx.lifecycle.validate_access(&pair.access_token.0).await,
        Err(AuthError::StoreUnavailable(_))
    ));
    assert!(matches!(
        fx.lifecycle.rotate(&pair.refresh_token.0).await,
        Err(AuthError::StoreUnavailable(_))
    ));
    assert!(matches!(
        fx.lifecycle
            .revoke(TokenKind::Access, pair.access_session_id)
            .await,
        Err(AuthError::StoreUnavailable(_))
    ));

    // Nothing was consumed while the store was down.
    fx.store.set_down(false);
    assert!(fx.lifecycle.rotate(&pair.refresh_token.0).await.is_ok());
}

#[tokio::test]
async fn test_bad_token_never_reaches_store() {
    let fx = fixture();

    assert!(matches!(
        fx.lifecycle.validate_access("garbage").await,
        Err(AuthError::Unauthenticated)
    ));
    assert!(matches!(
        fx.lifecycle.rotate("garbage").await,
        Err(AuthError::Unauthenticated)
    ));
    assert_eq!(
        fx.store.takes.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rotation_has_single_winner() {
    let fx = fixture();
    let pair = fx.lifecycle.issue(UserId(7)).await.unwrap();
    let lifecycle: Arc<dyn TokenLifecycle> = fx.lifecycle.clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            let token = pair.refresh_token.0.clone();
            tokio::spawn(async move { lifecycle.rotate(&token).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AuthError::Unauthenticated) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    // Original access session plus the winner's pair.
    assert_eq!(fx.store.inner.len(), 3);
}

#[test]
fn test_lifecycle_config_validation() {
    assert!(LifecycleConfig::new(FIFTEEN_MINUTES, SEVEN_DAYS).is_ok());
    assert!(LifecycleConfig::new(SEVEN_DAYS, FIFTEEN_MINUTES).is_err());
    assert!(LifecycleConfig::new(FIFTEEN_MINUTES, FIFTEEN_MINUTES).is_err());
    assert!(LifecycleConfig::new(Duration::from_millis(500), SEVEN_DAYS).is_err());
    assert!(
        LifecycleConfig::new(Duration::from_millis(1500), Duration::from_millis(1900)).is_err()
    );
}
