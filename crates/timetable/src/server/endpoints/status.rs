use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// GET /health
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /health");

    match s.snapshot_db.snapshot_count() {
        Ok(stored) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "courses": s.catalog.len(),
                "students": s.directory.student_count(),
                "residentSelections": s.selections.len(),
                "storedSelections": stored,
            })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Selection store unavailable",
            Some(e.to_string()),
        ))
        .into_response(),
    }
}
