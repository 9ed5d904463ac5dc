use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;

/// Session registry over a [`SessionStore`]. Keys are namespaced by token
/// kind: `{prefix}:{kind}:{session_id}`, valued with the owning user id.
pub struct StoreSessionRegistry {
    store: Arc<dyn SessionStore>,
    prefix: String,
}

impl StoreSessionRegistry {
    pub fn new(store: Arc<dyn SessionStore>, prefix: impl Into<String>) -> Self {
        StoreSessionRegistry {
            store,
            prefix: prefix.into(),
        }
    }

    fn key(&self, kind: TokenKind, session_id: SessionId) -> String {
        format!("{}:{}:{}", self.prefix, kind, session_id)
    }

    fn owner(key: &str, value: Option<String>) -> Result<Option<UserId>, StoreError> {
        value
            .map(|raw| {
                raw.parse::<UserId>().map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

#[async_trait::async_trait]
impl SessionRegistry for StoreSessionRegistry {
    async fn register(
        &self,
        kind: TokenKind,
        session_id: SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = self.key(kind, session_id);
        self.store.set(&key, &user_id.to_string(), ttl).await
    }

    async fn lookup(
        &self,
        kind: TokenKind,
        session_id: SessionId,
    ) -> Result<Option<UserId>, StoreError> {
        let key = self.key(kind, session_id);
        let value = self.store.get(&key).await?;
        Self::owner(&key, value)
    }

    async fn revoke(&self, kind: TokenKind, session_id: SessionId) -> Result<(), StoreError> {
        let key = self.key(kind, session_id);
        let _ = self.store.del(&key).await?;
        Ok(())
    }

    async fn consume(
        &self,
        kind: TokenKind,
        session_id: SessionId,
    ) -> Result<Option<UserId>, StoreError> {
        let key = self.key(kind, session_id);
        let value = self.store.take(&key).await?;
        Self::owner(&key, value)
    }
}
