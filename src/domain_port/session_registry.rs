use crate::domain_model::*;
use crate::domain_port::StoreError;
use std::time::Duration;

/// Revocable session bookkeeping. A `None` lookup means the session was never
/// created, already consumed, revoked, or expired; callers cannot tell which.
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn register(
        &self,
        kind: TokenKind,
        session_id: SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn lookup(
        &self,
        kind: TokenKind,
        session_id: SessionId,
    ) -> Result<Option<UserId>, StoreError>;

    /// No-op when the session is already gone.
    async fn revoke(&self, kind: TokenKind, session_id: SessionId) -> Result<(), StoreError>;

    /// Lookup and revoke as one atomic step.
    async fn consume(
        &self,
        kind: TokenKind,
        session_id: SessionId,
    ) -> Result<Option<UserId>, StoreError>;
}
