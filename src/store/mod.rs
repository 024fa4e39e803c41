// src/store/mod.rs
//! Expiring key-value store used both as the response cache and as the
//! delivery ledger. The service only ever talks to the [`KvStore`] trait;
//! deployments pick the file-backed store or the in-process one.

pub mod file;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

pub use file::{FileStore, DEFAULT_STORE_PATH};
pub use memory::{Clock, ManualClock, MemoryStore, SystemClock};

/// Page size used when enumerating keys for a bulk flush.
pub const LIST_PAGE_SIZE: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected key `{key}`: {reason}")]
    Rejected { key: String, reason: String },
}

/// One page of a prefix listing. `cursor` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub cursor: Option<String>,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replaces any existing value; the entry expires after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Lists live keys starting with `prefix`, resuming after `cursor`.
    async fn list(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<ListPage, StoreError>;
}

/// Delete every key in the store, page by page. Returns how many keys were removed.
///
/// Each delete is individually atomic; there is no cross-key transaction.
/// A failing delete is logged and skipped so the rest of the flush proceeds.
pub async fn flush_all(store: &dyn KvStore) -> Result<usize, StoreError> {
    let mut cursor: Option<String> = None;
    let mut removed = 0usize;

    loop {
        let page = store.list("", cursor.as_deref(), LIST_PAGE_SIZE).await?;
        for key in &page.keys {
            match store.delete(key).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(%key, error = %e, "flush: delete failed"),
            }
        }
        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(removed, "store flushed");
    Ok(removed)
}
