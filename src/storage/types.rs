//! Registry types and admission limits

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Maximum upload size: 100 MiB
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Reaper sweep interval: 1 hour
pub const REAPER_INTERVAL_SECS: u64 = 3600;

/// Maximum age of a registered file before the reaper evicts it: 1 hour
pub const MAX_FILE_AGE_SECS: u64 = 3600;

/// Owner recorded when the uploader does not identify itself
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// The only media type the admission gate accepts
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Snapshot file name inside the upload directory
pub const REGISTRY_FILE_NAME: &str = "file-registry.json";

// ============================================================================
// File Record
// ============================================================================

/// Metadata for one admitted upload.
///
/// The registry snapshot stores records keyed by id, so the id itself is
/// not serialized; it is restored from the map key on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(skip)]
    pub id: String,

    /// Absolute location of the stored payload
    pub path: PathBuf,

    /// Client-supplied name, untrusted, display only
    #[serde(rename = "originalName")]
    pub original_name: String,

    /// Declared content type at admission time
    #[serde(rename = "mimetype")]
    pub mime_type: String,

    /// Uploader id, or [`ANONYMOUS_OWNER`]
    #[serde(rename = "userId")]
    pub owner_id: String,

    /// Admission timestamp, drives eviction
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced while admitting an upload
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("Only PDF files are allowed (got {0})")]
    UnsupportedMediaType(String),

    #[error("File size exceeds {max} byte limit")]
    PayloadTooLarge { max: u64 },

    #[error("Upload stream failed: {0}")]
    StreamFault(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] std::io::Error),
}

impl AdmissionError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::StreamFault(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors from the registry itself
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two admissions produced the same id. Ids are freshly generated
    /// UUIDs, so this indicates internal state corruption.
    #[error("Duplicate file id generated: {0}")]
    IdCollision(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
