use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Verified against on unknown emails so both login paths pay for a hash.
const DECOY_PASSWORD: &str = "authgate-decoy-password";

pub struct RealAuthService {
    user_directory: Arc<dyn UserDirectory>,
    credential_hasher: Arc<dyn CredentialHasher>,
    lifecycle: Arc<dyn TokenLifecycle>,
    decoy_hash: OnceCell<String>,
}

impl RealAuthService {
    pub fn new(
        user_directory: Arc<dyn UserDirectory>,
        credential_hasher: Arc<dyn CredentialHasher>,
        lifecycle: Arc<dyn TokenLifecycle>,
    ) -> Self {
        Self {
            user_directory,
            credential_hasher,
            lifecycle,
            decoy_hash: OnceCell::new(),
        }
    }

    async fn verify_decoy(&self, password: &str) -> Result<(), AuthError> {
        let decoy_hash = self
            .decoy_hash
            .get_or_try_init(|| self.credential_hasher.hash_password(DECOY_PASSWORD))
            .await?;
        let _ = self
            .credential_hasher
            .verify_password(password, decoy_hash)
            .await?;
        Ok(())
    }
}

fn validate_registration(request: &RegisterInput) -> Result<(), AuthError> {
    if request.name.trim().is_empty() {
        return Err(AuthError::InvalidInput("name must not be empty".to_string()));
    }
    let email = request.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AuthError::InvalidInput("email is not valid".to_string())),
    }
    if request.password.is_empty() {
        return Err(AuthError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<UserId, AuthError> {
        validate_registration(&request)?;
        let RegisterInput {
            name,
            email,
            password,
        } = request;

        if self.user_directory.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        // `create` re-checks the email, so a concurrent duplicate still fails.
        let user_id = self
            .user_directory
            .create(email.trim(), name.trim(), &password_hash)
            .await?;
        info!(%user_id, "user registered");
        Ok(user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let Some(rec) = self.user_directory.find_by_email(&email).await? else {
            self.verify_decoy(&password).await?;
            debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            debug!(user_id = %rec.user_id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.lifecycle.issue(rec.user_id).await?;
        info!(user_id = %rec.user_id, "login succeeded");

        Ok(LoginResult {
            user_id: rec.user_id,
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.lifecycle.rotate(refresh_token).await
    }

    async fn logout(
        &self,
        principal: Principal,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        // Validate everything before revoking anything, so a bad refresh
        // token leaves the caller's sessions untouched.
        let refresh = match refresh_token {
            Some(token) => {
                let refresh = self.lifecycle.validate_refresh(token).await?;
                if refresh.user_id != principal.user_id {
                    warn!(user_id = %principal.user_id, "logout with another user's refresh token");
                    return Err(AuthError::Unauthenticated);
                }
                Some(refresh)
            }
            None => None,
        };

        self.lifecycle
            .revoke(TokenKind::Access, principal.session_id)
            .await?;
        if let Some(refresh) = refresh {
            self.lifecycle
                .revoke(TokenKind::Refresh, refresh.session_id)
                .await?;
        }

        info!(user_id = %principal.user_id, "logged out");
        Ok(())
    }

    async fn profile(&self, user_id: UserId) -> Result<UserProfile, AuthError> {
        self.user_directory
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
