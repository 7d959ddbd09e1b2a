//! External conversion pipeline
//!
//! Text PDFs go straight through the converter jar. Scanned PDFs first get
//! a text layer from `ocrmypdf` in the requested languages; without any
//! selected languages the service only reports that the document is
//! scanned so the client can ask the user for them.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use uuid::Uuid;

use super::ConvertError;
use crate::config::ConvertConfig;

/// Result of a conversion attempt
#[derive(Debug)]
pub enum ConvertOutcome {
    /// The document has no text layer and no OCR languages were chosen
    Scanned,
    /// Converted HTML with embedded fonts and images
    Html(String),
}

/// Drives the external PDF-to-HTML tools
#[derive(Clone)]
pub struct ConvertService {
    converter_jar: PathBuf,
    java_bin: String,
    ocrmypdf_bin: String,
    work_dir: PathBuf,
}

impl ConvertService {
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            converter_jar: config.converter_jar.clone(),
            java_bin: config.java_bin.clone(),
            ocrmypdf_bin: config.ocrmypdf_bin.clone(),
            work_dir: std::env::temp_dir(),
        }
    }

    /// Convert a stored PDF, optionally OCRing it first.
    pub async fn convert(
        &self,
        pdf_path: &Path,
        scanned: bool,
        languages: &[String],
    ) -> Result<ConvertOutcome, ConvertError> {
        if scanned && languages.is_empty() {
            return Ok(ConvertOutcome::Scanned);
        }

        if scanned {
            let ocr_path = self.work_dir.join(format!("ocr-{}.pdf", Uuid::new_v4()));
            let result = match self.run_ocr(pdf_path, &ocr_path, languages).await {
                Ok(()) => self.convert_to_html(&ocr_path).await,
                Err(e) => Err(e),
            };

            // The OCR artifact never outlives the request.
            if let Err(e) = tokio::fs::remove_file(&ocr_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, "Failed to remove temporary OCR output");
                }
            }

            return result.map(ConvertOutcome::Html);
        }

        self.convert_to_html(pdf_path).await.map(ConvertOutcome::Html)
    }

    /// Run the converter jar and return the generated HTML.
    pub async fn convert_to_html(&self, pdf_path: &Path) -> Result<String, ConvertError> {
        let html_path = self.work_dir.join(format!("html-{}.html", Uuid::new_v4()));

        let output = Command::new(&self.java_bin)
            .arg("-jar")
            .arg(&self.converter_jar)
            .arg(pdf_path)
            .arg(&html_path)
            .arg("-fm=EMBED_BASE64")
            .arg("-im=EMBED_BASE64")
            .output()
            .await
            .map_err(|e| ConvertError::ToolLaunch {
                tool: self.java_bin.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&html_path).await;
            return Err(ConvertError::ToolFailed {
                tool: self.converter_jar.display().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let html = tokio::fs::read_to_string(&html_path).await?;
        if let Err(e) = tokio::fs::remove_file(&html_path).await {
            tracing::warn!(error = %e, "Failed to remove generated HTML file");
        }

        tracing::debug!(
            pdf = %pdf_path.display(),
            html_bytes = html.len(),
            "Converted PDF to HTML"
        );
        Ok(html)
    }

    async fn run_ocr(
        &self,
        input: &Path,
        output_path: &Path,
        languages: &[String],
    ) -> Result<(), ConvertError> {
        let language = languages.join("+");

        let output = Command::new(&self.ocrmypdf_bin)
            .arg("--language")
            .arg(&language)
            .arg(input)
            .arg(output_path)
            .output()
            .await
            .map_err(|e| ConvertError::ToolLaunch {
                tool: self.ocrmypdf_bin.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                tool: self.ocrmypdf_bin.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        tracing::debug!(language = %language, "Added OCR text layer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> ConvertService {
        ConvertService::new(&ConvertConfig {
            converter_jar: PathBuf::from("./tools/PDFToHTML.jar"),
            java_bin: "java".to_string(),
            ocrmypdf_bin: "ocrmypdf".to_string(),
            pdfinfo_bin: "pdfinfo".to_string(),
        })
    }

    #[tokio::test]
    async fn test_scanned_without_languages_short_circuits() {
        let service = test_service();

        // No external tool runs on this path.
        let outcome = service
            .convert(Path::new("/nonexistent.pdf"), true, &[])
            .await
            .unwrap();

        assert!(matches!(outcome, ConvertOutcome::Scanned));
    }
}
