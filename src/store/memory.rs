// src/store/memory.rs
//! In-process TTL store. Expired entries are ignored on read and purged on
//! every write or listing.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{KvStore, ListPage, StoreError};

/// Millisecond wall clock, injectable so expiry can be simulated.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn starting_at(ms: u64) -> Self {
        Self {
            now: AtomicU64::new(ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: String,
    expires_at_ms: u64,
}

/// Ordered key space with expiry, shared by the in-process and file stores.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Table {
    entries: BTreeMap<String, Entry>,
}

impl Table {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&mut self, key: &str, now: u64) -> Option<String> {
        match self.entries.get(key) {
            Some(e) if e.expires_at_ms > now => Some(e.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Expired entries are purged on every write.
    pub(crate) fn put(&mut self, key: &str, value: &str, ttl: Duration, now: u64) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::Rejected {
                key: String::new(),
                reason: "empty key".into(),
            });
        }
        self.purge_expired(now);
        let expires_at_ms = now.saturating_add(ttl.as_millis() as u64);
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    pub(crate) fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every entry past its expiry. Returns how many went.
    pub(crate) fn purge_expired(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at_ms > now);
        before - self.entries.len()
    }

    pub(crate) fn list(&mut self, prefix: &str, cursor: Option<&str>, limit: usize, now: u64) -> ListPage {
        self.purge_expired(now);
        let lower = match cursor {
            Some(c) => Bound::Excluded(c.to_string()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut keys = Vec::new();
        let mut more = false;
        for (k, _) in self.entries.range((lower, Bound::Unbounded)) {
            if !k.starts_with(prefix) {
                if k.as_str() > prefix {
                    break;
                }
                continue;
            }
            if keys.len() == limit {
                more = true;
                break;
            }
            keys.push(k.clone());
        }

        let cursor = if more { keys.last().cloned() } else { None };
        ListPage { keys, cursor }
    }
}

pub struct MemoryStore {
    inner: Mutex<Table>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Table::default()),
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Entries held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Table>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".into()))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now_ms();
        Ok(self.lock()?.get(key, now))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now_ms();
        self.lock()?.put(key, value, ttl, now)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.delete(key);
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<ListPage, StoreError> {
        let now = self.clock.now_ms();
        Ok(self.lock()?.list(prefix, cursor, limit, now))
    }
}
