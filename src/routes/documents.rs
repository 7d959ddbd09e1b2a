//! Saved document routes
//!
//! Pages are saved one at a time into a per-user staging area, then
//! finalized into a named folder; saved folders can be fetched back or
//! deleted wholesale.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::documents::SavedDocument;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the saved documents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/save-pdf-page", post(save_page))
        .route("/finalize-pdf", post(finalize_pdf))
        .route("/get-pdf-files/:user_id/:folder_name", get(get_document))
        .route("/files", delete(delete_document))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePageRequest {
    user_id: String,
    page_id: String,
    elements: Value,
    thumbnail: Value,
}

async fn save_page(
    State(state): State<AppState>,
    Json(request): Json<SavePageRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .documents()
        .save_page(
            &request.user_id,
            &request.page_id,
            &request.elements,
            &request.thumbnail,
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Page data saved",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeRequest {
    user_id: String,
    styles: String,
    meta_data: Value,
}

async fn finalize_pdf(
    State(state): State<AppState>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .documents()
        .finalize(&request.user_id, &request.styles, &request.meta_data)
        .await?;

    Ok(Json(MessageResponse {
        message: "PDF data finalized successfully",
    }))
}

async fn get_document(
    State(state): State<AppState>,
    Path((user_id, folder_name)): Path<(String, String)>,
) -> Result<Json<SavedDocument>> {
    let document = state
        .documents()
        .load(&user_id, &folder_name)
        .await?
        .ok_or_else(|| AppError::NotFound("Files not found".to_string()))?;

    Ok(Json(document))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDocumentRequest {
    user_id: String,
    folder_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDocumentResponse {
    message: &'static str,
    user_id: String,
    folder_name: String,
}

async fn delete_document(
    State(state): State<AppState>,
    Json(request): Json<DeleteDocumentRequest>,
) -> Result<Json<DeleteDocumentResponse>> {
    let deleted = state
        .documents()
        .delete(&request.user_id, &request.folder_name)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("File directory not found".to_string()));
    }

    Ok(Json(DeleteDocumentResponse {
        message: "File deleted successfully",
        user_id: request.user_id,
        folder_name: request.folder_name,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::config::Config;
    use crate::routes;
    use crate::state::AppState;

    async fn test_app(dir: &std::path::Path) -> axum::Router {
        let mut config = Config::default();
        config.storage.upload_dir = dir.join("uploads");
        config.documents.root_dir = dir.join("pdf");
        config.documents.templates_dir = dir.join("templates");
        let state = AppState::new(config).await.unwrap();
        routes::app(state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_finalize_fetch_flow() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/save-pdf-page",
                serde_json::json!({
                    "userId": "user-1",
                    "pageId": "page-1",
                    "elements": [{"id": "el-1", "type": "text", "content": "Hi"}],
                    "thumbnail": "thumb"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/finalize-pdf",
                serde_json::json!({
                    "userId": "user-1",
                    "styles": "<style></style>",
                    "metaData": {"folderName": "notes"}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/get-pdf-files/user-1/notes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["document"]["page-1"][0]["id"], "el-1");
        assert_eq!(json["thumbnails"]["page-1"], "thumb");
    }

    #[tokio::test]
    async fn test_delete_missing_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;

        let response = app
            .oneshot(json_request(
                "DELETE",
                "/files",
                serde_json::json!({"userId": "user-1", "folderName": "ghost"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/save-pdf-page",
                serde_json::json!({
                    "userId": "../../etc",
                    "pageId": "page-1",
                    "elements": [],
                    "thumbnail": null
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
