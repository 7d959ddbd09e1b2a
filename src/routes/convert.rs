//! PDF upload and conversion route
//!
//! `POST /get-pdf-data` takes a multipart form with the PDF itself
//! (`pdfFile`) and conversion hints (`userId`, `isScanned`,
//! `selectedLanguages`). The upload is admitted into the registry first;
//! the returned id stays valid for follow-up download and delete calls.

use axum::{
    extract::{multipart::Field, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::convert::{ConvertOutcome, PdfInfo};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::FileRecord;

/// Create the conversion router
pub fn router() -> Router<AppState> {
    Router::new().route("/get-pdf-data", post(convert_pdf))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertResponse {
    file_id: String,
    html_content: HtmlContent,
    pdf_info: PdfInfo,
}

#[derive(Serialize)]
struct HtmlContent {
    scanned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl From<ConvertOutcome> for HtmlContent {
    fn from(outcome: ConvertOutcome) -> Self {
        match outcome {
            ConvertOutcome::Scanned => HtmlContent {
                scanned: true,
                content: None,
            },
            ConvertOutcome::Html(content) => HtmlContent {
                scanned: false,
                content: Some(content),
            },
        }
    }
}

#[derive(Default)]
struct UploadForm {
    is_scanned: bool,
    languages: Vec<String>,
}

async fn convert_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>> {
    let mut file_id: Option<String> = None;

    // The upload only survives a successful conversion; any failure past
    // admission deletes it again.
    let form = match read_form(&state, &mut multipart, &mut file_id).await {
        Ok(form) => form,
        Err(e) => {
            if let Some(id) = &file_id {
                state.registry().remove(id).await;
            }
            return Err(e);
        }
    };

    let Some(file_id) = file_id else {
        return Err(AppError::BadRequest("No PDF file uploaded".to_string()));
    };

    let Some(record) = state.registry().lookup(&file_id).await else {
        return Err(AppError::NotFound("File not found".to_string()));
    };

    match process(&state, &record, &form).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            state.registry().remove(&file_id).await;
            Err(e)
        }
    }
}

/// Walk the multipart form, admitting the PDF as soon as its part arrives.
///
/// `file_id` is an out-parameter so the caller can clean up an already
/// admitted upload when a later part fails.
async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
    file_id: &mut Option<String>,
) -> Result<UploadForm> {
    let mut form = UploadForm::default();
    let mut owner: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "pdfFile" => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload.pdf".to_string());
                let declared_mime = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let id = state
                    .admission()
                    .admit(
                        field_stream(field),
                        &declared_mime,
                        &original_name,
                        owner.as_deref(),
                    )
                    .await?;
                *file_id = Some(id);
            }
            "userId" => owner = Some(read_text(field).await?),
            "isScanned" => form.is_scanned = read_text(field).await? == "true",
            "selectedLanguages" => {
                form.languages = serde_json::from_str(&read_text(field).await?).unwrap_or_default()
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn process(
    state: &AppState,
    record: &FileRecord,
    form: &UploadForm,
) -> Result<ConvertResponse> {
    let mut info = state.inspector().inspect(&record.path).await?;
    info.file_id = Some(record.id.clone());

    if !info.page_size.is_usable() {
        return Err(AppError::Internal("Could not extract page size".to_string()));
    }

    let outcome = state
        .converter()
        .convert(&record.path, form.is_scanned, &form.languages)
        .await?;

    Ok(ConvertResponse {
        file_id: record.id.clone(),
        html_content: outcome.into(),
        pdf_info: info,
    })
}

/// Adapt a multipart field into the byte stream the admission gate takes.
fn field_stream(
    field: Field<'_>,
) -> impl futures::Stream<Item = std::result::Result<axum::body::Bytes, axum::extract::multipart::MultipartError>>
       + '_ {
    futures::stream::try_unfold(field, |mut field| async move {
        Ok(field.chunk().await?.map(|chunk| (chunk, field)))
    })
}

async fn read_text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read form field: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::config::Config;
    use crate::routes;
    use crate::state::AppState;

    const BOUNDARY: &str = "X-FOLIO-TEST-BOUNDARY";

    async fn test_app(dir: &std::path::Path, max_upload_bytes: u64) -> axum::Router {
        let mut config = Config::default();
        config.storage.upload_dir = dir.join("uploads");
        config.storage.max_upload_bytes = max_upload_bytes;
        config.documents.root_dir = dir.join("pdf");
        config.documents.templates_dir = dir.join("templates");
        let state = AppState::new(config).await.unwrap();
        routes::app(state)
    }

    fn upload_request(mime: &str, payload: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"pdfFile\"; filename=\"test.pdf\"\r\n\
             Content-Type: {mime}\r\n\r\n\
             {payload}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::post("/get-pdf-data")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_415_and_unregistered() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), 1024).await;

        let response = app
            .oneshot(upload_request("image/png", "not a pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        // Nothing but the snapshot lives in the upload directory.
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["file-registry.json"]);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413_and_unregistered() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), 8).await;

        let response = app
            .oneshot(upload_request("application/pdf", "%PDF-1.4 too big"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["file-registry.json"]);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), 1024).await;

        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"isScanned\"\r\n\r\n\
             false\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::post("/get-pdf-data")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
