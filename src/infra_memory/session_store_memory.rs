use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Every this many writes, `set` sweeps out expired entries.
const PURGE_EVERY_WRITES: usize = 256;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Session store kept in a `DashMap`. Expired keys are dropped when touched,
/// and swept in batches every [`PURGE_EVERY_WRITES`] writes or on
/// [`MemorySessionStore::purge_expired`].
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of a live key.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn take_live(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .remove(key)
            .and_then(|(_, entry)| entry.is_live(now).then_some(entry.value))
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Unavailable(format!("ttl out of range: {:?}", ttl)))?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % PURGE_EVERY_WRITES == 0 {
            self.purge_expired();
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.take_live(key).is_some())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.take_live(key))
    }
}
