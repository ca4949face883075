use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::info;

use crate::api::DocumentSummary;
use crate::store::DocumentStore;
use crate::sync;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub root: PathBuf,
}

pub fn router() -> Router<AppState> {
    // POST only; axum answers 405 for anything else on these paths.
    Router::new()
        .route("/export", post(export))
        .route("/import", post(import))
}

/// POST /export: walk the root and return a summary of every readable
/// document. Scan failure is the only request-level error.
pub async fn export(State(state): State<AppState>) -> Response {
    match sync::export_all(state.store.as_ref(), &state.root) {
        Ok(docs) => {
            info!(count = docs.len(), "exported documents");
            (StatusCode::OK, Json(docs)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, root = %state.root.display(), "export scan failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /import: aggregate the payload by content hash, then merge into
/// every matching document under the root. Malformed JSON is rejected
/// before any file is touched.
pub async fn import(State(state): State<AppState>, body: Bytes) -> Response {
    let summaries: Vec<DocumentSummary> = match serde_json::from_slice(&body) {
        Ok(summaries) => summaries,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("invalid json: {e}")).into_response();
        }
    };

    let aggregated = sync::aggregate(&summaries);
    match sync::import_into(state.store.as_ref(), &state.root, &aggregated) {
        Ok(summary) => {
            info!(
                files = summary.files.len(),
                total_imported = summary.total_imported,
                "import finished"
            );
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, root = %state.root.display(), "import scan failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
