//! File-backed cache store.
//!
//! Keeps the whole map in memory and rewrites one JSON file on every write,
//! so cached responses survive a restart. The file is written from a
//! snapshot, so readers never wait on disk I/O. Fine for the handful of keys this
//! crate uses; not meant as a general-purpose database.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::{CacheEntry, CacheError, CacheStore};

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: HashMap<String, CacheEntry>,
}

/// Cache store persisted to a JSON file.
#[derive(Debug)]
pub struct DiskStore {
    path: PathBuf,
    stale_grace: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Held across snapshot and write so files land in mutation order.
    writer: Mutex<()>,
}

impl DiskStore {
    /// Open the store at `path`.
    ///
    /// A missing or unreadable file starts an empty cache rather than failing.
    pub async fn open(path: impl Into<PathBuf>, stale_grace: Duration) -> Self {
        let path = path.into();
        let entries = match load(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
                HashMap::new()
            }
        };

        Self {
            path,
            stale_grace,
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
        }
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop entries that have been stale for longer than the grace period.
    fn prune(&self, entries: &mut HashMap<String, CacheEntry>) {
        let cutoff = Utc::now().timestamp() - self.stale_grace.as_secs() as i64;
        entries.retain(|_, entry| entry.expires_at.is_none_or(|at| at > cutoff));
    }

    async fn persist(&self, file: CacheFile) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string(&file)?;

        // Write then rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

async fn load(path: &Path) -> Result<HashMap<String, CacheEntry>, CacheError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    let file: CacheFile = serde_json::from_str(&contents)?;
    Ok(file.entries)
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_string(), entry);
            self.prune(&mut entries);
            CacheFile {
                entries: entries.clone(),
            }
        };
        self.persist(snapshot).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut entries = self.entries.write().await;
            if entries.remove(key).is_none() {
                return Ok(());
            }
            CacheFile {
                entries: entries.clone(),
            }
        };
        self.persist(snapshot).await
    }

    async fn invalidate_all(&self) -> Result<(), CacheError> {
        let _writer = self.writer.lock().await;
        self.entries.write().await.clear();
        self.persist(CacheFile::default()).await
    }
}
