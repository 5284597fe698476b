use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, Weekday};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::occupancy::OccupancySnapshot;
use crate::server::types::ApiErrorType;
use crate::timing::ClockTime;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct FreeHallsQuery {
    /// 1 = Monday .. 7 = Sunday
    day: Option<u8>,
    /// `HHMM` or `HH:MM`
    time: Option<String>,
}

/// GET /halls/free?day=...&time=...
/// Either parameter falls back to the server's local clock when omitted.
pub async fn get_free_halls(
    Query(query): Query<FreeHallsQuery>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /halls/free day={:?} time={:?}", query.day, query.time);

    let now = chrono::Local::now().naive_local();

    let weekday = match query.day {
        None => now.weekday(),
        Some(day) => match day.checked_sub(1).map(Weekday::try_from) {
            Some(Ok(weekday)) => weekday,
            _ => {
                return ApiErrorType::from((
                    StatusCode::BAD_REQUEST,
                    "Invalid day",
                    Some(format!("expected 1 (Monday) to 7 (Sunday), got {day}")),
                ))
                .into_response()
            }
        },
    };

    let time = match query.time.as_deref().map(str::parse::<ClockTime>) {
        None => ClockTime::from_time(&now.time()),
        Some(Ok(time)) => time,
        Some(Err(e)) => {
            return ApiErrorType::from((StatusCode::BAD_REQUEST, "Invalid time", Some(e.to_string())))
                .into_response()
        }
    };

    let snapshot =
        OccupancySnapshot::for_weekday(&s.catalog, &s.extra_occupied, &s.room_filter, weekday, time);
    (StatusCode::OK, Json(snapshot)).into_response()
}
