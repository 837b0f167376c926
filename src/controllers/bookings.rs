use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::models::BookingWithSeat;
use crate::services;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_bookings))
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", put(update_booking))
        .route("/bookings/{id}", delete(delete_booking))
}

/* ---------- DTO ---------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingsQuery {
    date: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateBookingRequest {
    seat_id: Option<i64>,
    #[validate(length(min = 1, message = "userName обязателен"))]
    user_name: Option<String>,
    // Либо один день, либо пара границ диапазона
    date: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateBookingRequest {
    #[validate(length(min = 1, message = "userName не может быть пустым"))]
    user_name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatInfo {
    id: i64,
    row: i32,
    col: i32,
    label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingReportResponse {
    id: i64,
    seat_id: i64,
    user_name: String,
    date: DateTime<Utc>,
    seat: SeatInfo,
}

impl From<BookingWithSeat> for BookingReportResponse {
    fn from(row: BookingWithSeat) -> Self {
        BookingReportResponse {
            id: row.id,
            seat_id: row.seat_id,
            user_name: row.user_name,
            date: row.date,
            seat: SeatInfo {
                id: row.seat_id,
                row: row.seat_row,
                col: row.seat_col,
                label: row.seat_label,
            },
        }
    }
}

/* ---------- BOOKINGS ---------- */

// GET /api/bookings?date=YYYY-MM-DD
// GET /api/bookings?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD
async fn get_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookingsQuery>,
) -> ApiResult<Json<Vec<BookingReportResponse>>> {
    let pool = &state.db.pool;

    let rows = match (params.date, params.start_date, params.end_date) {
        // Один день приоритетнее диапазона
        (Some(date), _, _) => {
            services::bookings::bookings_for_day(pool, state.tz, &date).await?
        }
        (None, Some(start), Some(end)) => {
            services::bookings::bookings_in_range(pool, state.tz, &start, &end).await?
        }
        (None, Some(_), None) => {
            return Err(ApiError::validation("endDate обязателен вместе со startDate"));
        }
        (None, None, Some(_)) => {
            return Err(ApiError::validation("startDate обязателен вместе с endDate"));
        }
        (None, None, None) => {
            return Err(ApiError::validation(
                "Нужно передать date или пару startDate и endDate",
            ));
        }
    };

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let seat_id = req
        .seat_id
        .ok_or_else(|| ApiError::validation("seatId обязателен"))?;
    let user_name = req
        .user_name
        .as_deref()
        .ok_or_else(|| ApiError::validation("userName обязателен"))?;

    let pool = &state.db.pool;

    if let Some(date) = &req.date {
        let booking =
            services::bookings::create_single_day(pool, state.tz, seat_id, date, user_name)
                .await?;
        return Ok((StatusCode::CREATED, Json(json!(booking))));
    }

    if let (Some(start), Some(end)) = (&req.start_date, &req.end_date) {
        let bookings =
            services::bookings::create_range(pool, state.tz, seat_id, start, end, user_name)
                .await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "bookings": bookings, "count": bookings.len() })),
        ));
    }

    Err(ApiError::validation(
        "Нужно передать date или пару startDate и endDate",
    ))
}

// PUT /api/bookings/{id}
async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let booking = services::bookings::update_booking(
        &state.db.pool,
        state.tz,
        id,
        req.user_name.as_deref(),
        req.date.as_deref(),
    )
    .await?;

    Ok(Json(booking))
}

// DELETE /api/bookings/{id}
async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    services::bookings::delete_booking(&state.db.pool, id).await?;
    Ok(Json(json!({ "message": "Бронирование удалено" })))
}
