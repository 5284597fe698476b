use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// GET /students/:id/courses
pub async fn get_student_courses(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /students/{}/courses", id);

    match s.directory.lookup_student_courses(&id) {
        Ok(codes) => (
            StatusCode::OK,
            Json(json!({
                "studentId": id.to_lowercase(),
                "courses": codes,
            })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from((StatusCode::NOT_FOUND, "Student not found", Some(e.to_string())))
            .into_response(),
    }
}
