//! PDF inspection and conversion
//!
//! All PDF understanding is delegated to external tools: poppler's
//! `pdfinfo` for metadata and page geometry, `ocrmypdf` for adding a text
//! layer to scanned documents, and the converter jar for producing the
//! editable HTML.

pub mod pdfinfo;
pub mod service;

pub use pdfinfo::{PdfInfo, PdfInspector};
pub use service::{ConvertOutcome, ConvertService};

/// Errors from the external conversion tools
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with failure: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
