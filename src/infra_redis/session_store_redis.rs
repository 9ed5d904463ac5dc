use crate::domain_port::*;
use anyhow::anyhow;
use redis::RedisResult;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;

/// Redis-backed session store. Every command is bounded by `op_timeout`;
/// reconnects are left to the `ConnectionManager`.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        RedisSessionStore { conn, op_timeout }
    }

    pub async fn connect(url: &str, op_timeout: Duration) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(op_timeout, client.get_connection_manager())
            .await
            .map_err(|_| anyhow!("timed out connecting to redis"))??;
        Ok(Self::new(conn, op_timeout))
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))?
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let millis = (ttl.as_millis() as u64).max(1);
        let mut conn = self.conn.clone();
        let _: () = self.bounded(conn.pset_ex(key, value, millis)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = self.bounded(conn.get(key)).await?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: usize = self.bounded(conn.del(key)).await?;
        Ok(removed > 0)
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        // GETDEL, Redis >= 6.2.
        let mut conn = self.conn.clone();
        let value: Option<String> = self.bounded(conn.get_del(key)).await?;
        Ok(value)
    }
}
