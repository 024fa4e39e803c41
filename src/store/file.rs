// src/store/file.rs
//! JSON snapshot store. The whole key space lives in memory and is rewritten
//! to disk after every mutation (temp file + rename), so the ledger and the
//! stale copies survive a restart.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::memory::{Clock, Table};
use super::{KvStore, ListPage, StoreError};

pub const DEFAULT_STORE_PATH: &str = "data/store.json";

pub struct FileStore {
    path: PathBuf,
    table: Mutex<Table>,
    clock: Arc<dyn Clock>,
}

fn unavailable(path: &Path, what: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{what} {}: {e}", path.display()))
}

impl FileStore {
    /// Loads `path` if it exists. A missing file starts empty; an unparsable
    /// one is logged and replaced on the next write.
    pub async fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| unavailable(dir, "creating", e))?;
        }

        let mut table = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Table>(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "store snapshot unreadable, starting empty");
                Table::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Table::default(),
            Err(e) => return Err(unavailable(&path, "reading", e)),
        };
        let dropped = table.purge_expired(clock.now_ms());
        info!(path = %path.display(), keys = table.len(), dropped, "file store opened");

        Ok(Self {
            path,
            table: Mutex::new(table),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Caller holds the table lock, so snapshots land in mutation order.
    async fn persist(&self, table: &Table) -> Result<(), StoreError> {
        let json = serde_json::to_vec(table).map_err(|e| unavailable(&self.path, "encoding", e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .await
            .map_err(|e| unavailable(&tmp, "writing", e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| unavailable(&self.path, "replacing", e))?;
        debug!(path = %self.path.display(), bytes = json.len(), "store snapshot written");
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now_ms();
        Ok(self.table.lock().await.get(key, now))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now_ms();
        let mut table = self.table.lock().await;
        table.put(key, value, ttl, now)?;
        self.persist(&table).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        if table.delete(key) {
            self.persist(&table).await?;
        }
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<ListPage, StoreError> {
        let now = self.clock.now_ms();
        Ok(self.table.lock().await.list(prefix, cursor, limit, now))
    }
}
