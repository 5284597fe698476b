use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::catalog::DEFAULT_SEARCH_LIMIT;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Largest page a client may ask for.
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

/// GET /courses?q=...&offset=...&limit=...
pub async fn get_search_courses(
    Query(query): Query<SearchQuery>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /courses q={:?} offset={}", query.q, query.offset);

    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let page = s.catalog.search(&query.q, query.offset, limit);

    (
        StatusCode::OK,
        Json(json!({
            "total": page.total,
            "offset": query.offset,
            "limit": limit,
            "courses": page.courses,
        })),
    )
        .into_response()
}

/// GET /courses/:code
/// Course record plus its decoded sessions and credit breakdown
pub async fn get_course(Path(code): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /courses/{}", code);

    let course = match s.catalog.lookup(&code) {
        Ok(course) => course,
        Err(e) => {
            return ApiErrorType::from((StatusCode::NOT_FOUND, "Course not found", Some(e.to_string())))
                .into_response()
        }
    };

    let credits = course.credits();
    (
        StatusCode::OK,
        Json(json!({
            "course": course,
            "credits": {
                "lecture": credits.lecture,
                "tutorial": credits.tutorial,
                "lab": credits.lab,
                "total": credits.total(),
            },
            "sessions": {
                "lecture": course.lecture_sessions(),
                "tutorial": course.tutorial_sessions(),
                "lab": course.lab_sessions(),
            },
            "enrolled": s.directory.students_in_course(&course.course_code),
        })),
    )
        .into_response()
}
