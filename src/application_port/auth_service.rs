use crate::domain_model::*;
use crate::domain_port::{DirectoryError, StoreError};
use chrono::{DateTime, Utc};

/// The only error kinds callers above the token lifecycle boundary see.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("token issuance failed: {0}")]
    Issuance(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::StoreUnavailable(error.to_string())
    }
}

impl From<DirectoryError> for AuthError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::EmailTaken => AuthError::EmailTaken,
            DirectoryError::Backend(e) => AuthError::InternalError(e),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

pub trait TokenCodec: Send + Sync {
    fn mint(
        &self,
        kind: TokenKind,
        user_id: UserId,
        session_id: SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, CodecError>;

    /// Verifies signature, algorithm, expiry and that the token is of `kind`.
    fn parse(&self, kind: TokenKind, token: &str) -> Result<Claims, CodecError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a directory entry; fails with `EmailTaken` on a duplicate email.
    async fn register(&self, request: RegisterInput) -> Result<UserId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    /// Revokes the caller's access session and, when given, the matching refresh token.
    async fn logout(
        &self,
        principal: Principal,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError>;
    async fn profile(&self, user_id: UserId) -> Result<UserProfile, AuthError>;
}
