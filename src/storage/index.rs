//! Durable registry snapshot
//!
//! The in-memory registry map is mirrored to one pretty-printed JSON file
//! after every mutation. The snapshot is advisory: the map stays
//! authoritative for the process lifetime, and a failed write only costs
//! durability until the next successful one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::FileRecord;

/// Persists the registry map as a single JSON object keyed by file id.
pub struct RegistryIndex {
    path: PathBuf,
}

impl RegistryIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot into a map.
    ///
    /// A missing or unreadable snapshot never fails startup: the registry
    /// begins empty and a fresh empty snapshot is written in its place.
    pub async fn load(&self) -> HashMap<String, FileRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let records = HashMap::new();
                self.save(&records).await;
                tracing::info!(path = %self.path.display(), "Created new empty registry snapshot");
                return records;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to read registry snapshot, starting empty"
                );
                let records = HashMap::new();
                self.save(&records).await;
                return records;
            }
        };

        match serde_json::from_slice::<HashMap<String, FileRecord>>(&bytes) {
            Ok(mut records) => {
                // Ids live in the map keys; put them back on the records.
                for (id, record) in records.iter_mut() {
                    record.id = id.clone();
                }
                tracing::info!(entries = records.len(), "Loaded registry snapshot");
                records
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Registry snapshot is corrupt, starting empty"
                );
                let records = HashMap::new();
                self.save(&records).await;
                records
            }
        }
    }

    /// Overwrite the snapshot with the full map. Write failures are logged
    /// and swallowed.
    pub async fn save(&self, records: &HashMap<String, FileRecord>) {
        let json = match serde_json::to_vec_pretty(records) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize registry snapshot");
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&self.path, json).await {
            tracing::error!(
                error = %e,
                path = %self.path.display(),
                "Failed to persist registry snapshot"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_record(id: &str, dir: &Path) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            path: dir.join(format!("{id}.pdf")),
            original_name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            owner_id: "user-1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_missing_creates_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let index = RegistryIndex::new(dir.path().join("file-registry.json"));

        let records = index.load().await;

        assert!(records.is_empty());
        assert!(index.path().exists());
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index = RegistryIndex::new(dir.path().join("file-registry.json"));

        let mut records = HashMap::new();
        records.insert("abc".to_string(), test_record("abc", dir.path()));
        index.save(&records).await;

        let loaded = index.load().await;
        let record = &loaded["abc"];
        assert_eq!(record.id, "abc");
        assert_eq!(record.original_name, "report.pdf");
        assert_eq!(record.owner_id, "user-1");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_self_repairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file-registry.json");
        std::fs::write(&path, "{not json").unwrap();

        let index = RegistryIndex::new(&path);
        let records = index.load().await;

        assert!(records.is_empty());
        // The bad file was replaced with a parseable empty snapshot.
        let repaired = std::fs::read_to_string(&path).unwrap();
        assert_eq!(repaired.trim(), "{}");
    }

    #[tokio::test]
    async fn test_snapshot_uses_wire_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let index = RegistryIndex::new(dir.path().join("file-registry.json"));

        let mut records = HashMap::new();
        records.insert("abc".to_string(), test_record("abc", dir.path()));
        index.save(&records).await;

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(index.path()).unwrap()).unwrap();
        let entry = &raw["abc"];
        assert!(entry.get("originalName").is_some());
        assert!(entry.get("mimetype").is_some());
        assert!(entry.get("userId").is_some());
        assert!(entry.get("createdAt").is_some());
        assert!(entry.get("id").is_none());
    }
}
