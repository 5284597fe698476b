use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::DbError;
use crate::schedule::Component;
use crate::selection::{SelectionError, SelectionManager, UserKey};
use crate::server::types::ApiErrorType;
use crate::timing::Session;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCoursesBody {
    codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AutoFetchBody {
    #[serde(alias = "studentId")]
    student_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetComponentBody {
    sessions: Vec<Session>,
}

#[derive(Debug, Deserialize)]
pub struct AddSessionBody {
    session: Session,
}

fn db_error(e: DbError) -> Response {
    error!("Selection store failure: {}", e);
    ApiErrorType::from((
        StatusCode::INTERNAL_SERVER_ERROR,
        "Selection store error",
        Some(e.to_string()),
    ))
    .into_response()
}

fn selection_error(e: SelectionError) -> Response {
    let status = match e {
        SelectionError::NotSelected { .. } => StatusCode::NOT_FOUND,
        SelectionError::ComponentNotOffered { .. } | SelectionError::Invalid(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    ApiErrorType::from((status, "Selection edit rejected", Some(e.to_string()))).into_response()
}

/// Clones the user's selection, applies `edit`, persists the result and only
/// then replaces the resident copy. A failed edit or save leaves both
/// untouched.
async fn mutate_selection<T>(
    s: &AppState,
    key: &UserKey,
    edit: impl FnOnce(&mut SelectionManager) -> Result<T, SelectionError>,
) -> Result<(T, SelectionManager), Response> {
    let shared = s
        .selections
        .get_or_load(key, || s.snapshot_db.load_selection(key))
        .map_err(db_error)?;
    let mut current = shared.lock().await;

    let mut next = current.clone();
    let out = edit(&mut next).map_err(selection_error)?;
    s.snapshot_db.save_selection(key, &next).map_err(db_error)?;
    *current = next.clone();

    Ok((out, next))
}

/// Reads a selection without making it resident: users nobody is editing
/// are served straight from the snapshot store.
async fn read_selection(s: &AppState, key: &UserKey) -> Result<SelectionManager, Response> {
    match s.selections.get(key) {
        Some(shared) => Ok(shared.lock().await.clone()),
        None => s.snapshot_db.load_selection(key).map_err(db_error),
    }
}

fn selection_body(selection: &SelectionManager) -> Response {
    (StatusCode::OK, Json(selection.snapshot())).into_response()
}

/// GET /selection/:user
pub async fn get_selection(Path(user): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "GET /selection");

    match read_selection(&s, &key).await {
        Ok(selection) => selection_body(&selection),
        Err(response) => response,
    }
}

/// DELETE /selection/:user
pub async fn delete_selection(
    Path(user): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "DELETE /selection");

    let shared = match s
        .selections
        .get_or_load(&key, || s.snapshot_db.load_selection(&key))
    {
        Ok(shared) => shared,
        Err(e) => return db_error(e),
    };
    let mut current = shared.lock().await;

    match s.snapshot_db.delete_selection(&key) {
        Ok(existed) => {
            *current = SelectionManager::new();
            (StatusCode::OK, Json(json!({ "deleted": existed }))).into_response()
        }
        Err(e) => db_error(e),
    }
}

/// POST /selection/:user/courses
/// Adds every known code not already selected; unknown codes are reported back.
pub async fn post_add_courses(
    Path(user): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<AddCoursesBody>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, count = body.codes.len(), "POST /selection/courses");

    add_codes(&s, &key, body.codes).await
}

/// POST /selection/:user/auto_fetch
/// Adds the courses a student is registered for.
pub async fn post_auto_fetch(
    Path(user): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<AutoFetchBody>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "POST /selection/auto_fetch");

    let codes = match s.directory.lookup_student_courses(&body.student_id) {
        Ok(codes) => codes.to_vec(),
        Err(e) => {
            return ApiErrorType::from((StatusCode::NOT_FOUND, "Student not found", Some(e.to_string())))
                .into_response()
        }
    };
    add_codes(&s, &key, codes).await
}

async fn add_codes(s: &AppState, key: &UserKey, codes: Vec<String>) -> Response {
    let mut unknown: Vec<String> = Vec::new();
    for code in codes.iter().map(|code| code.trim()) {
        if s.catalog.get(code).is_none() && !unknown.iter().any(|seen| seen == code) {
            unknown.push(code.to_string());
        }
    }
    if !unknown.is_empty() {
        warn!(user = %key, ?unknown, "Skipping codes missing from the catalog");
    }

    let catalog = &s.catalog;
    match mutate_selection(s, key, |selection| Ok(selection.add_courses(catalog, &codes))).await {
        Ok((added, selection)) => (
            StatusCode::OK,
            Json(json!({
                "added": added,
                "unknown": unknown,
                "selection": selection.snapshot(),
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// DELETE /selection/:user/courses/:code
/// Removing a course that is not selected succeeds with `removed: false`.
pub async fn delete_course(
    Path((user, code)): Path<(String, String)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "DELETE /selection/courses/{}", code);

    match mutate_selection(&s, &key, |selection| Ok(selection.remove_course(&code))).await {
        Ok((removed, selection)) => (
            StatusCode::OK,
            Json(json!({
                "removed": removed,
                "selection": selection.snapshot(),
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// PUT /selection/:user/courses/:code/:component
/// Replaces the whole component; an empty list clears it.
pub async fn put_component(
    Path((user, code, component)): Path<(String, String, Component)>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<SetComponentBody>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "PUT /selection/courses/{}/{}", code, component);

    let result = mutate_selection(&s, &key, |selection| {
        selection.set_component(&code, component, body.sessions)
    })
    .await;
    match result {
        Ok((_, selection)) => selection_body(&selection),
        Err(response) => response,
    }
}

/// POST /selection/:user/courses/:code/:component
pub async fn post_session(
    Path((user, code, component)): Path<(String, String, Component)>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<AddSessionBody>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "POST /selection/courses/{}/{}", code, component);

    let result = mutate_selection(&s, &key, |selection| {
        selection.add_session(&code, component, body.session)
    })
    .await;
    match result {
        Ok((_, selection)) => selection_body(&selection),
        Err(response) => response,
    }
}

/// DELETE /selection/:user/courses/:code/:component/:index
pub async fn delete_session(
    Path((user, code, component, index)): Path<(String, String, Component, usize)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "DELETE /selection/courses/{}/{}/{}", code, component, index);

    let result = mutate_selection(&s, &key, |selection| {
        selection.remove_session(&code, component, index)
    })
    .await;
    match result {
        Ok((removed, selection)) => (
            StatusCode::OK,
            Json(json!({
                "removed": removed,
                "selection": selection.snapshot(),
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /selection/:user/export
pub async fn get_export(Path(user): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "GET /selection/export");

    match read_selection(&s, &key).await {
        Ok(selection) => (StatusCode::OK, Json(selection.export_sessions())).into_response(),
        Err(response) => response,
    }
}

/// GET /selection/:user/calendar.ics
pub async fn get_calendar(Path(user): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    let key = UserKey::from_user_id(&user);
    info!(user = %key, "GET /selection/calendar.ics");

    match read_selection(&s, &key).await {
        Ok(selection) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
            s.calendar.to_ics(&selection.export_sessions()),
        )
            .into_response(),
        Err(response) => response,
    }
}
