//! `pdfinfo` invocation and output parsing
//!
//! The editor lays out overlay pages from the source document's page
//! geometry, so conversion is refused when no page size can be read.

use std::path::Path;

use serde::Serialize;
use tokio::process::Command;

use super::ConvertError;

/// Parsed `pdfinfo` output
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagged: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspects: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<String>,
    pub page_size: PageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_rot: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_version: Option<String>,
    /// Registry id of the inspected upload, filled in by the route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// Page geometry in points
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
    /// Named size when poppler recognizes one, e.g. "letter" or "A4"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_type: Option<String>,
}

impl PageSize {
    pub fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Runs `pdfinfo` over stored uploads
#[derive(Clone)]
pub struct PdfInspector {
    pdfinfo_bin: String,
}

impl PdfInspector {
    pub fn new(pdfinfo_bin: impl Into<String>) -> Self {
        Self {
            pdfinfo_bin: pdfinfo_bin.into(),
        }
    }

    pub async fn inspect(&self, pdf_path: &Path) -> Result<PdfInfo, ConvertError> {
        let output = Command::new(&self.pdfinfo_bin)
            .arg(pdf_path)
            .output()
            .await
            .map_err(|e| ConvertError::ToolLaunch {
                tool: self.pdfinfo_bin.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                tool: self.pdfinfo_bin.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(parse_pdfinfo(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `pdfinfo`'s key/value output.
pub fn parse_pdfinfo(stdout: &str) -> PdfInfo {
    let mut info = PdfInfo::default();

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if value.is_empty() {
            continue;
        }

        match key {
            "Title" => info.title = Some(value.to_string()),
            "Producer" => info.producer = Some(value.to_string()),
            "Tagged" => info.tagged = Some(value.to_string()),
            "UserProperties" => info.user_properties = Some(value.to_string()),
            "Suspects" => info.suspects = Some(value.to_string()),
            "Form" => info.form = Some(value.to_string()),
            "JavaScript" => info.java_script = Some(value.to_string()),
            "Pages" => info.pages = value.parse().ok(),
            "Encrypted" => info.encrypted = Some(value.to_string()),
            "Page size" => info.page_size = parse_page_size(value),
            "Page rot" => info.page_rot = value.parse().ok(),
            "File size" => info.file_size = Some(value.to_string()),
            "Optimized" => info.optimized = Some(value.to_string()),
            "PDF version" => info.pdf_version = Some(value.to_string()),
            _ => {}
        }
    }

    info
}

/// Parse a page size value like `612 x 792 pts (letter)`.
fn parse_page_size(value: &str) -> PageSize {
    let mut size = PageSize::default();

    let mut parts = value.split_whitespace();
    if let (Some(width), Some("x"), Some(height)) = (parts.next(), parts.next(), parts.next()) {
        size.width = width.parse().unwrap_or(0.0);
        size.height = height.parse().unwrap_or(0.0);
    }

    if let Some(label) = value
        .split('(')
        .nth(1)
        .and_then(|rest| rest.strip_suffix(')'))
    {
        size.size_type = Some(label.to_string());
    }

    size
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Title:           Quarterly Report
Producer:        LibreOffice 7.4
Tagged:          no
UserProperties:  no
Suspects:        no
Form:            none
JavaScript:      no
Pages:           12
Encrypted:       no
Page size:       612 x 792 pts (letter)
Page rot:        0
File size:       104857 bytes
Optimized:       no
PDF version:     1.7
";

    #[test]
    fn test_parse_full_output() {
        let info = parse_pdfinfo(SAMPLE);

        assert_eq!(info.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(info.producer.as_deref(), Some("LibreOffice 7.4"));
        assert_eq!(info.pages, Some(12));
        assert_eq!(info.page_rot, Some(0));
        assert_eq!(info.pdf_version.as_deref(), Some("1.7"));
        assert_eq!(info.page_size.width, 612.0);
        assert_eq!(info.page_size.height, 792.0);
        assert_eq!(info.page_size.size_type.as_deref(), Some("letter"));
        assert!(info.page_size.is_usable());
    }

    #[test]
    fn test_parse_page_size_without_label() {
        let size = parse_page_size("595.276 x 841.89 pts");

        assert_eq!(size.width, 595.276);
        assert_eq!(size.height, 841.89);
        assert!(size.size_type.is_none());
    }

    #[test]
    fn test_parse_garbage_yields_unusable_page_size() {
        let info = parse_pdfinfo("not pdfinfo output at all");

        assert!(!info.page_size.is_usable());
        assert!(info.pages.is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let info = parse_pdfinfo(SAMPLE);
        let json = serde_json::to_value(&info).unwrap();

        assert!(json.get("pageSize").is_some());
        assert!(json.get("pdfVersion").is_some());
        assert_eq!(json["pageSize"]["sizeType"], "letter");
    }
}
