use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::models::Seat;
use crate::services;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(get_seats))
        .route("/seats", post(regenerate_layout))
        .route("/seats/{id}", put(update_seat_label))
}

/* ---------- DTO ---------- */

#[derive(Debug, Deserialize)]
struct RegenerateLayoutRequest {
    rows: Option<i32>,
    cols: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateSeatRequest {
    #[validate(length(min = 1, message = "label обязателен"))]
    label: Option<String>,
}

/* ---------- SEATS ---------- */

// GET /api/seats
async fn get_seats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Seat>>> {
    let seats = services::seats::list_seats(&state.db.pool).await?;
    Ok(Json(seats))
}

// POST /api/seats - полная перегенерация рассадки (для админа).
// Разрушительно: все существующие брони удаляются вместе со старыми местами.
async fn regenerate_layout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegenerateLayoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let rows = req
        .rows
        .ok_or_else(|| ApiError::validation("rows обязателен"))?;
    let cols = req
        .cols
        .ok_or_else(|| ApiError::validation("cols обязателен"))?;

    let seats = services::seats::regenerate_layout(&state.db.pool, rows, cols).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Рассадка обновлена", "seats": seats })),
    ))
}

// PUT /api/seats/{id} - правка подписи места
async fn update_seat_label(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSeatRequest>,
) -> ApiResult<Json<Seat>> {
    req.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let label = req
        .label
        .as_deref()
        .ok_or_else(|| ApiError::validation("label обязателен"))?;

    let seat = services::seats::update_label(&state.db.pool, id, label).await?;
    Ok(Json(seat))
}
