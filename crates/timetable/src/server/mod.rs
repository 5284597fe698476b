use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::server::endpoints::{catalog, halls, selection, status, students};
use crate::types::AppState;

mod endpoints;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let selection_router = Router::new()
        .route(
            "/",
            get(selection::get_selection).delete(selection::delete_selection),
        )
        .route("/courses", post(selection::post_add_courses))
        .route("/auto_fetch", post(selection::post_auto_fetch))
        .route("/courses/:code", delete(selection::delete_course))
        .route(
            "/courses/:code/:component",
            put(selection::put_component).post(selection::post_session),
        )
        .route(
            "/courses/:code/:component/:index",
            delete(selection::delete_session),
        )
        .route("/export", get(selection::get_export))
        .route("/calendar.ics", get(selection::get_calendar));

    Router::new()
        .route("/health", get(status::get_health))
        .route("/courses", get(catalog::get_search_courses))
        .route("/courses/:code", get(catalog::get_course))
        .route("/halls/free", get(halls::get_free_halls))
        .route("/students/:id/courses", get(students::get_student_courses))
        .nest("/selection/:user", selection_router)
        .with_state(app_state)
}
