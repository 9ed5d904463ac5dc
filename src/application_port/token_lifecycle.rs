use super::AuthError;
use crate::domain_model::*;

/// Issuance, validation, rotation and revocation of token pairs.
#[async_trait::async_trait]
pub trait TokenLifecycle: Send + Sync {
    /// Mints a pair under two fresh sessions. All-or-nothing.
    async fn issue(&self, user_id: UserId) -> Result<TokenPair, AuthError>;

    /// Read-only check of an access token against its live session.
    async fn validate_access(&self, token: &str) -> Result<Principal, AuthError>;

    /// Read-only check of a refresh token against its live session.
    async fn validate_refresh(&self, token: &str) -> Result<Principal, AuthError>;

    /// Consumes the refresh session, then issues a new pair. Single-use.
    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    async fn revoke(&self, kind: TokenKind, session_id: SessionId) -> Result<(), AuthError>;
}
