//! Registry file routes
//!
//! Metadata lookup and explicit deletion for uploaded PDFs. A file that
//! was evicted (by age or a failed disk check) is indistinguishable from
//! one that never existed.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the registry files router
pub fn router() -> Router<AppState> {
    Router::new().route("/pdf-files/:file_id", get(get_file_info).delete(delete_file))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileInfoResponse {
    file_id: String,
    original_name: String,
    mimetype: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

async fn get_file_info(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileInfoResponse>> {
    let record = state.registry().lookup(&file_id).await.ok_or_else(|| {
        AppError::NotFound("File not found. It may have been deleted or expired.".to_string())
    })?;

    // The storage path stays server-side.
    Ok(Json(FileInfoResponse {
        file_id: record.id,
        original_name: record.original_name,
        mimetype: record.mime_type,
        user_id: record.owner_id,
        created_at: record.created_at,
    }))
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.registry().remove(&file_id).await;
    Json(DeleteResponse { deleted })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
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

    #[tokio::test]
    async fn test_unknown_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;

        let response = app
            .oneshot(
                Request::get("/pdf-files/no-such-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_unknown_file_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;

        let response = app
            .oneshot(
                Request::delete("/pdf-files/no-such-id")
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
        assert_eq!(json["deleted"], false);
    }
}
