//! Error types for the Folio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::convert::ConvertError;
use crate::documents::DocumentError;
use crate::overlay::OverlayError;
use crate::render::RenderError;
use crate::storage::AdmissionError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
            AppError::Admission(e) => (e.status_code(), "upload_rejected", e.to_string()),
            AppError::Convert(e) => {
                tracing::error!("Conversion error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "conversion_error",
                    "Error processing PDF".to_string(),
                )
            }
            AppError::Render(e) => match e {
                RenderError::InvalidScale(_) | RenderError::MissingCustomSize => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
                _ => {
                    tracing::error!("Render error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "render_error",
                        "PDF generation failed".to_string(),
                    )
                }
            },
            AppError::Overlay(e) => {
                tracing::error!("Overlay error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "overlay_error",
                    "Error preparing annotated pages".to_string(),
                )
            }
            AppError::Document(e) => match e {
                DocumentError::InvalidName(_)
                | DocumentError::MissingFolderName
                | DocumentError::UnknownTemplate(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
                _ => {
                    tracing::error!("Document error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "document_error",
                        "Error accessing saved document".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
