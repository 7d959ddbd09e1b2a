//! HTML to PDF rendering
//!
//! The editor's assembled pages go through a real browser engine so the
//! downloaded PDF matches what the client rendered. The page geometry the
//! client asked for is injected as a style preamble rather than passed as
//! browser flags.

mod options;

pub use options::{Layout, MarginPreset, Margins, RenderOptions, DEFAULT_PAPER_SIZE};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use uuid::Uuid;

use crate::config::RenderConfig;

/// Anything smaller than this is not a believable PDF.
const MIN_PDF_BYTES: usize = 200;

/// Errors from the rendering pipeline
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid scale value: {0}. Must be between 0.1 and 2")]
    InvalidScale(f64),

    #[error("Custom paper size requires width and height")]
    MissingCustomSize,

    #[error("Failed to launch {tool}: {source}")]
    BrowserLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF rendering failed: {0}")]
    BrowserFailed(String),

    #[error("Generated PDF is empty or too small")]
    EmptyOutput,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Renders HTML to PDF bytes through headless Chromium
#[derive(Clone)]
pub struct PdfRenderer {
    chromium_bin: String,
    timeout: Duration,
    work_dir: PathBuf,
}

impl PdfRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            chromium_bin: config.chromium_bin.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            work_dir: std::env::temp_dir(),
        }
    }

    /// Render an HTML document with the given print options.
    pub async fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
        options.validate()?;

        let stamp = Uuid::new_v4();
        let html_path = self.work_dir.join(format!("print-{stamp}.html"));
        let pdf_path = self.work_dir.join(format!("print-{stamp}.pdf"));

        let page = format!("{}{html}", options.page_style());
        tokio::fs::write(&html_path, page).await?;

        let printed = self.print(&html_path, &pdf_path).await;
        let _ = tokio::fs::remove_file(&html_path).await;

        let bytes = match printed {
            Ok(()) => tokio::fs::read(&pdf_path).await.map_err(RenderError::Io),
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&pdf_path).await;

        let bytes = bytes?;
        if bytes.len() < MIN_PDF_BYTES {
            return Err(RenderError::EmptyOutput);
        }

        tracing::debug!(pdf_bytes = bytes.len(), "Rendered PDF");
        Ok(bytes)
    }

    async fn print(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
        let mut command = Command::new(&self.chromium_bin);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(html_path);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RenderError::BrowserFailed("render timed out".to_string()))?
            .map_err(|e| RenderError::BrowserLaunch {
                tool: self.chromium_bin.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(RenderError::BrowserFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}
