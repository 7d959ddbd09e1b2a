//! PDF download routes
//!
//! `POST /download-pdf` renders the client's assembled page HTML straight
//! to a PDF attachment. `POST /download-scanned` re-converts a registered
//! upload, layers the editor's overlay elements onto it, renders, and
//! deletes the upload once the download is on its way.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::overlay::{inject_overlays, ElementsByPage};
use crate::render::RenderOptions;
use crate::state::AppState;

/// Hides the editor's element-options chrome in print output
const EDITOR_CHROME_CSS: &str = "<style>.current-el-options {display: none!important}</style>";

/// Create the download router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download-pdf", post(download_pdf))
        .route("/download-scanned", post(download_scanned))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadPdfRequest {
    pages_container: String,
    #[serde(default)]
    download_options: Option<RenderOptions>,
}

async fn download_pdf(
    State(state): State<AppState>,
    Json(request): Json<DownloadPdfRequest>,
) -> Result<Response> {
    if request.pages_container.trim().is_empty() {
        return Err(AppError::BadRequest("Empty content provided".to_string()));
    }

    let options = request.download_options.unwrap_or_default();
    let html = format!("{EDITOR_CHROME_CSS}\n{}", request.pages_container);
    let bytes = state.renderer().render(&html, &options).await?;

    pdf_response(bytes, "document.pdf")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadScannedRequest {
    #[serde(rename = "PDFInfo")]
    pdf_info: ScannedPdfInfo,
    #[serde(default)]
    elements_by_page_id: ElementsByPage,
    #[serde(default)]
    download_options: Option<RenderOptions>,
    #[serde(default)]
    styles: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScannedPdfInfo {
    file_id: Option<String>,
    title: Option<String>,
    page_size: Option<RequestPageSize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestPageSize {
    size_type: Option<String>,
}

async fn download_scanned(
    State(state): State<AppState>,
    Json(request): Json<DownloadScannedRequest>,
) -> Result<Response> {
    let file_id = request
        .pdf_info
        .file_id
        .ok_or_else(|| AppError::BadRequest("File ID is required".to_string()))?;

    let record = state.registry().lookup(&file_id).await.ok_or_else(|| {
        AppError::NotFound("File not found. It may have been deleted or expired.".to_string())
    })?;

    let html = state.converter().convert_to_html(&record.path).await?;
    let html = inject_overlays(&html, &request.elements_by_page_id)?;

    let mut options = request.download_options.unwrap_or_default();
    if options.paper_size.is_none() {
        // Fall back to the source document's detected paper size.
        options.paper_size = request
            .pdf_info
            .page_size
            .and_then(|size| size.size_type);
    }

    let document = format!("{EDITOR_CHROME_CSS}\n{}\n{html}", request.styles);
    let bytes = state.renderer().render(&document, &options).await?;

    let title = request.pdf_info.title.as_deref().unwrap_or("document");
    let response = pdf_response(bytes, &format!("{title}.pdf"))?;

    // The upload is single-use: downloading it ends its lifetime.
    state.registry().remove(&file_id).await;

    Ok(response)
}

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Result<Response> {
    let filename = filename.replace(['"', '\r', '\n'], "");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(bytes.into())
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_response_headers() {
        let response = pdf_response(vec![0u8; 512], "My \"Report\".pdf").unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE.as_str()], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION.as_str()],
            "attachment; filename=\"My Report.pdf\""
        );
    }
}
