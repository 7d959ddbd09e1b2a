//! Template retrieval route

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::documents::TemplateFiles;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the templates router
pub fn router() -> Router<AppState> {
    Router::new().route("/get-template/:kind", get(get_template))
}

async fn get_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<TemplateFiles>> {
    let template = state
        .documents()
        .template(&kind.to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    Ok(Json(template))
}
