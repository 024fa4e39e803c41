//! Delivery ledger for the scheduled digest.
//!
//! Presence of `story:<id>` means the item was already delivered. Entries
//! expire on their own after seven days. Store failures read as "not sent":
//! a duplicate notification is preferred over a silently dropped one.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::store::{self, KvStore, StoreError};

pub const LEDGER_PREFIX: &str = "story:";
pub const LEDGER_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const MARKER: &str = "sent";

#[derive(Clone)]
pub struct SentLedger {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl SentLedger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            ttl: LEDGER_TTL,
        }
    }

    pub fn key(id: impl Display) -> String {
        format!("{LEDGER_PREFIX}{id}")
    }

    pub async fn was_sent(&self, id: impl Display) -> bool {
        let key = Self::key(id);
        match self.store.get(&key).await {
            Ok(v) => v.is_some(),
            Err(e) => {
                warn!(%key, error = %e, "ledger read failed, treating as not sent");
                false
            }
        }
    }

    pub async fn mark_sent(&self, id: impl Display) {
        let key = Self::key(id);
        if let Err(e) = self.store.put(&key, MARKER, self.ttl).await {
            warn!(%key, error = %e, "ledger write failed");
        }
    }

    /// Drops every key in the backing store (ledger and cache alike).
    pub async fn flush(&self) -> Result<usize, StoreError> {
        store::flush_all(self.store.as_ref()).await
    }
}
