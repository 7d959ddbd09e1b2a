//! File registry core
//!
//! The authoritative in-memory map of admitted uploads, mirrored to a
//! durable snapshot after every mutation and bounded by a background
//! reaper. Lookups trust the disk over the cached index: a record whose
//! backing file has gone missing is evicted on read.
//!
//! Lock discipline: sections holding the map lock only perform map
//! operations; every disk access (snapshot write, unlink, existence
//! check) happens outside the lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use super::index::RegistryIndex;
use super::types::{FileRecord, RegistryError, REGISTRY_FILE_NAME};

/// Registry of uploaded files
#[derive(Clone)]
pub struct FileRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    records: RwLock<HashMap<String, FileRecord>>,
    index: RegistryIndex,
    upload_dir: PathBuf,
}

impl FileRegistry {
    /// Open the registry over an upload directory, creating the directory
    /// and loading (or initializing) its snapshot.
    pub async fn open(upload_dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let upload_dir = upload_dir.into();
        tokio::fs::create_dir_all(&upload_dir).await?;

        let index = RegistryIndex::new(upload_dir.join(REGISTRY_FILE_NAME));
        let records = index.load().await;
        tracing::debug!(
            snapshot = %index.path().display(),
            entries = records.len(),
            "Opened file registry"
        );

        Ok(Self {
            inner: Arc::new(RegistryInner {
                records: RwLock::new(records),
                index,
                upload_dir,
            }),
        })
    }

    /// Directory uploads are stored in
    pub fn upload_dir(&self) -> &Path {
        &self.inner.upload_dir
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Insert a freshly admitted record and persist the snapshot.
    ///
    /// The record is visible to lookups before this returns.
    pub async fn register(&self, record: FileRecord) -> Result<(), RegistryError> {
        let snapshot = {
            let mut records = self.inner.records.write().await;
            if records.contains_key(&record.id) {
                return Err(RegistryError::IdCollision(record.id));
            }
            tracing::info!(
                file_id = %record.id,
                original_name = %record.original_name,
                owner_id = %record.owner_id,
                "Registered uploaded file"
            );
            records.insert(record.id.clone(), record);
            records.clone()
        };

        self.inner.index.save(&snapshot).await;
        Ok(())
    }

    /// Look up a record, verifying its backing file still exists.
    ///
    /// A record whose file is gone is removed from the map and the
    /// snapshot, and reported as absent.
    pub async fn lookup(&self, id: &str) -> Option<FileRecord> {
        let record = { self.inner.records.read().await.get(id).cloned() }?;

        if tokio::fs::try_exists(&record.path).await.unwrap_or(false) {
            return Some(record);
        }

        tracing::warn!(
            file_id = %id,
            path = %record.path.display(),
            "Registered file missing on disk, evicting entry"
        );
        let snapshot = {
            let mut records = self.inner.records.write().await;
            records.remove(id);
            records.clone()
        };
        self.inner.index.save(&snapshot).await;
        None
    }

    /// Remove a record and its backing file.
    ///
    /// The map entry goes first so concurrent lookups never observe a
    /// record mid-unlink; the file removal is best-effort either way.
    /// Returns true iff an entry was present.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut records = self.inner.records.write().await;
            records.remove(id).map(|record| (record, records.clone()))
        };

        let Some((record, snapshot)) = removed else {
            return false;
        };

        if let Err(e) = tokio::fs::remove_file(&record.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!(file_id = %id, error = %e, "Failed to delete backing file");
            }
        }
        self.inner.index.save(&snapshot).await;

        tracing::info!(file_id = %id, "Deleted registered file");
        true
    }

    // ========================================================================
    // Reaper
    // ========================================================================

    /// Evict every record older than `max_age`, deleting backing files.
    ///
    /// Returns the number of evicted entries. The snapshot is persisted
    /// once per sweep, not per entry.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let now = Utc::now();

        let expired: Vec<(String, PathBuf)> = {
            let records = self.inner.records.read().await;
            records
                .iter()
                .filter(|(_, record)| {
                    // A future created_at (clock skew) never expires.
                    (now - record.created_at)
                        .to_std()
                        .map(|age| age > max_age)
                        .unwrap_or(false)
                })
                .map(|(id, record)| (id.clone(), record.path.clone()))
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        for (id, path) in &expired {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    // The entry is still purged below; an orphaned file is
                    // the lesser failure.
                    tracing::error!(file_id = %id, error = %e, "Failed to delete expired file");
                }
            }
        }

        let (count, snapshot) = {
            let mut records = self.inner.records.write().await;
            let mut count = 0;
            for (id, _) in &expired {
                if records.remove(id).is_some() {
                    count += 1;
                }
            }
            (count, records.clone())
        };

        if count > 0 {
            self.inner.index.save(&snapshot).await;
            tracing::info!(count = count, "Reaped expired uploads");
        }
        count
    }

    /// Start the background reaper task
    pub fn start_reaper(self, interval: Duration, max_age: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so a freshly
            // started server does not sweep before serving anything.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.sweep_expired(max_age).await;
            }
        })
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Number of registered entries
    pub async fn len(&self) -> usize {
        self.inner.records.read().await.len()
    }

    /// Whether an id is present in the raw map, without the disk check
    pub async fn contains(&self, id: &str) -> bool {
        self.inner.records.read().await.contains_key(id)
    }
}
