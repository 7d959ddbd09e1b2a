//! Route modules for Folio Server

pub mod convert;
pub mod documents;
pub mod download;
pub mod files;
pub mod health;
pub mod templates;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    // The body limit covers the upload ceiling plus multipart framing;
    // the admission gate enforces the exact per-file ceiling.
    let body_limit = state.config().storage.max_upload_bytes as usize + 1024 * 1024;

    Router::new()
        .merge(health::router())
        .merge(convert::router())
        .merge(files::router())
        .merge(download::router())
        .merge(documents::router())
        .merge(templates::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
