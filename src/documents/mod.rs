//! Saved document storage
//!
//! Edited documents are plain files under `<root>/<user>/<folder>`:
//! `document.json`, `thumbnails.json`, `styles.html` and `metadata.json`.
//! Pages are staged per user in a temp area until finalization. Templates
//! live in a read-only tree of the same shape.

mod store;

pub use store::{DocumentStore, SavedDocument, TemplateFiles};

/// Errors from saved-document storage
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// A client-supplied path segment (user id, page id, folder name) was
    /// not a plain `[A-Za-z0-9_-]{1,255}` name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Missing folderName in metadata")]
    MissingFolderName,

    #[error("Invalid template type: {0}")]
    UnknownTemplate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Document serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
