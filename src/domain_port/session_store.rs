use std::time::Duration;

/// Key-value store with per-key expiration. Every call is atomic per key.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Returns whether a live key was removed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;

    /// Get and delete in one step; concurrent callers see the value at most once.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
