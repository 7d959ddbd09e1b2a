//! Upload admission
//!
//! Validates an inbound byte stream and turns it into a registered file.
//! The declared media type is checked before anything touches disk; the
//! size ceiling is enforced while streaming, so an oversized or aborted
//! upload leaves neither a partial file nor a registry entry.

use std::path::Path;

use axum::body::Bytes;
use chrono::Utc;
use futures::{pin_mut, Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::registry::FileRegistry;
use super::types::{AdmissionError, FileRecord, ANONYMOUS_OWNER, PDF_MIME_TYPE};

/// Admits uploads into a [`FileRegistry`]
#[derive(Clone)]
pub struct AdmissionGate {
    registry: FileRegistry,
    max_bytes: u64,
}

impl AdmissionGate {
    pub fn new(registry: FileRegistry, max_bytes: u64) -> Self {
        Self {
            registry,
            max_bytes,
        }
    }

    /// Validate and store an upload stream, returning the new file id.
    ///
    /// Registration happens only after the stream has completed in full,
    /// so the returned id is immediately usable for lookups.
    pub async fn admit<S, E>(
        &self,
        stream: S,
        declared_mime: &str,
        original_name: &str,
        owner: Option<&str>,
    ) -> Result<String, AdmissionError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        if declared_mime != PDF_MIME_TYPE {
            return Err(AdmissionError::UnsupportedMediaType(
                declared_mime.to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let path = self
            .registry
            .upload_dir()
            .join(format!("{id}{}", normalized_extension(original_name)));

        if let Err(e) = self.write_stream(stream, &path).await {
            // Partial payloads never stay behind.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        let record = FileRecord {
            id: id.clone(),
            path,
            original_name: original_name.to_string(),
            mime_type: declared_mime.to_string(),
            owner_id: owner.unwrap_or(ANONYMOUS_OWNER).to_string(),
            created_at: Utc::now(),
        };

        self.registry
            .register(record)
            .await
            .map_err(|e| AdmissionError::Storage(std::io::Error::other(e.to_string())))?;

        Ok(id)
    }

    async fn write_stream<S, E>(&self, stream: S, path: &Path) -> Result<(), AdmissionError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;

        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AdmissionError::StreamFault(e.to_string()))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(AdmissionError::PayloadTooLarge {
                    max: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::debug!(path = %path.display(), bytes = written, "Stored upload payload");
        Ok(())
    }
}

/// Extension for the stored file, taken from the client-supplied name.
fn normalized_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| ".pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn byte_stream(
        chunks: Vec<&'static [u8]>,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> {
        futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    async fn test_gate(max_bytes: u64) -> (tempfile::TempDir, AdmissionGate, FileRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileRegistry::open(dir.path()).await.unwrap();
        let gate = AdmissionGate::new(registry.clone(), max_bytes);
        (dir, gate, registry)
    }

    #[tokio::test]
    async fn test_admit_round_trip() {
        let (_dir, gate, registry) = test_gate(1024).await;
        let payload: &[u8] = b"%PDF-1.4 payload bytes";

        let id = gate
            .admit(
                byte_stream(vec![payload]),
                "application/pdf",
                "report.pdf",
                Some("user-1"),
            )
            .await
            .unwrap();

        let record = registry.lookup(&id).await.unwrap();
        assert_eq!(record.original_name, "report.pdf");
        assert_eq!(record.owner_id, "user-1");
        let stored = tokio::fs::read(&record.path).await.unwrap();
        assert_eq!(stored, payload);
    }

    #[tokio::test]
    async fn test_admit_defaults_to_anonymous_owner() {
        let (_dir, gate, registry) = test_gate(1024).await;

        let id = gate
            .admit(
                byte_stream(vec![b"%PDF-1.4"]),
                "application/pdf",
                "report.pdf",
                None,
            )
            .await
            .unwrap();

        assert_eq!(registry.lookup(&id).await.unwrap().owner_id, ANONYMOUS_OWNER);
    }

    #[tokio::test]
    async fn test_rejects_non_pdf_media_type() {
        let (_dir, gate, registry) = test_gate(1024).await;

        let err = gate
            .admit(
                byte_stream(vec![b"\x89PNG"]),
                "image/png",
                "image.png",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AdmissionError::UnsupportedMediaType(_)));
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_rejects_oversized_payload() {
        let (dir, gate, registry) = test_gate(16).await;

        let err = gate
            .admit(
                byte_stream(vec![b"0123456789", b"0123456"]),
                "application/pdf",
                "big.pdf",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AdmissionError::PayloadTooLarge { max: 16 }));
        assert_eq!(registry.len().await, 0);

        // Only the snapshot file remains; the partial payload was removed.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["file-registry.json"]);
    }

    #[tokio::test]
    async fn test_payload_at_ceiling_is_accepted() {
        let (_dir, gate, registry) = test_gate(16).await;

        let id = gate
            .admit(
                byte_stream(vec![b"0123456789", b"012345"]),
                "application/pdf",
                "exact.pdf",
                None,
            )
            .await
            .unwrap();

        assert!(registry.lookup(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_stream_fault_registers_nothing() {
        let (dir, gate, registry) = test_gate(1024).await;

        let stream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"%PDF-1.4")),
            Err("connection reset"),
        ]);
        let err = gate
            .admit(stream, "application/pdf", "broken.pdf", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AdmissionError::StreamFault(_)));
        assert_eq!(registry.len().await, 0);
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["file-registry.json"]);
    }

    #[test]
    fn test_normalized_extension() {
        assert_eq!(normalized_extension("report.pdf"), ".pdf");
        assert_eq!(normalized_extension("REPORT.PDF"), ".pdf");
        assert_eq!(normalized_extension("archive.backup.Pdf"), ".pdf");
        assert_eq!(normalized_extension("no-extension"), ".pdf");
    }
}
