use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use anyhow::bail;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Store TTLs are never shorter than this, even for a token about to expire.
const MIN_SESSION_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl LifecycleConfig {
    /// TTLs are whole seconds on the wire, so the access lifetime must be at
    /// least one second and strictly shorter than the refresh lifetime there.
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> anyhow::Result<Self> {
        if access_ttl.as_secs() == 0 {
            bail!("access token TTL must be at least one second");
        }
        if access_ttl.as_secs() >= refresh_ttl.as_secs() {
            bail!(
                "access token TTL ({:?}) must be shorter than refresh token TTL ({:?})",
                access_ttl,
                refresh_ttl
            );
        }
        Ok(LifecycleConfig {
            access_ttl,
            refresh_ttl,
        })
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            access_ttl: Duration::from_secs(15 * 60),       // 15 minutes
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

struct Minted {
    token: String,
    session_id: SessionId,
    expires_at: DateTime<Utc>,
}

pub struct RealTokenLifecycle {
    codec: Arc<dyn TokenCodec>,
    registry: Arc<dyn SessionRegistry>,
    config: LifecycleConfig,
}

impl RealTokenLifecycle {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        registry: Arc<dyn SessionRegistry>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            codec,
            registry,
            config,
        }
    }

    fn mint(
        &self,
        kind: TokenKind,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Minted, AuthError> {
        let exp = now.timestamp() + self.config.ttl(kind).as_secs() as i64;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InternalError(format!("{} expiry out of range", kind)))?;
        let session_id = SessionId::generate();
        let token = self
            .codec
            .mint(kind, user_id, session_id, expires_at)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok(Minted {
            token,
            session_id,
            expires_at,
        })
    }

    fn remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (until - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .max(MIN_SESSION_TTL)
    }

    async fn authenticate(&self, kind: TokenKind, token: &str) -> Result<Principal, AuthError> {
        let claims = self.codec.parse(kind, token).map_err(|e| {
            debug!(%kind, error = %e, "token rejected");
            AuthError::Unauthenticated
        })?;

        match self.registry.lookup(kind, claims.sid).await? {
            Some(owner) if owner == claims.uid => Ok(Principal {
                user_id: claims.uid,
                session_id: claims.sid,
            }),
            Some(owner) => {
                warn!(%kind, session_id = %claims.sid, claimed = %claims.uid, %owner, "session owner mismatch");
                Err(AuthError::Unauthenticated)
            }
            None => {
                debug!(%kind, session_id = %claims.sid, "session not found");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}

#[async_trait::async_trait]
impl TokenLifecycle for RealTokenLifecycle {
    async fn issue(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access = self.mint(TokenKind::Access, user_id, now)?;
        let refresh = self.mint(TokenKind::Refresh, user_id, now)?;

        self.registry
            .register(
                TokenKind::Access,
                access.session_id,
                user_id,
                Self::remaining(access.expires_at, now),
            )
            .await
            .map_err(|e| {
                warn!(%user_id, error = %e, "access session registration failed");
                AuthError::Issuance(e.to_string())
            })?;

        if let Err(e) = self
            .registry
            .register(
                TokenKind::Refresh,
                refresh.session_id,
                user_id,
                Self::remaining(refresh.expires_at, now),
            )
            .await
        {
            warn!(%user_id, error = %e, "refresh session registration failed, rolling back");
            // The access token was never handed out, so a failed rollback
            // only leaves an unreachable record until its TTL runs out.
            if let Err(rollback) = self
                .registry
                .revoke(TokenKind::Access, access.session_id)
                .await
            {
                error!(%user_id, session_id = %access.session_id, error = %rollback, "access session rollback failed");
            }
            return Err(AuthError::Issuance(e.to_string()));
        }

        info!(
            %user_id,
            access_session = %access.session_id,
            refresh_session = %refresh.session_id,
            "token pair issued"
        );

        Ok(TokenPair {
            access_token: AccessToken(access.token),
            refresh_token: RefreshToken(refresh.token),
            access_session_id: access.session_id,
            refresh_session_id: refresh.session_id,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }

    async fn validate_access(&self, token: &str) -> Result<Principal, AuthError> {
        self.authenticate(TokenKind::Access, token).await
    }

    async fn validate_refresh(&self, token: &str) -> Result<Principal, AuthError> {
        self.authenticate(TokenKind::Refresh, token).await
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .parse(TokenKind::Refresh, refresh_token)
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected");
                AuthError::Unauthenticated
            })?;

        // Consume before issuing: a crash in between loses the session
        // rather than leaving the old refresh token usable.
        match self
            .registry
            .consume(TokenKind::Refresh, claims.sid)
            .await?
        {
            Some(owner) if owner == claims.uid => {}
            Some(owner) => {
                warn!(session_id = %claims.sid, claimed = %claims.uid, %owner, "refresh session owner mismatch");
                return Err(AuthError::Unauthenticated);
            }
            None => {
                debug!(session_id = %claims.sid, "refresh session already used, revoked or expired");
                return Err(AuthError::Unauthenticated);
            }
        }

        debug!(user_id = %claims.uid, session_id = %claims.sid, "refresh session consumed");
        self.issue(claims.uid).await
    }

    async fn revoke(&self, kind: TokenKind, session_id: SessionId) -> Result<(), AuthError> {
        self.registry.revoke(kind, session_id).await?;
        info!(%kind, %session_id, "session revoked");
        Ok(())
    }
}
