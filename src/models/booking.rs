use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Бронь всегда ровно на один календарный день: date - это полночь
// этого дня в часовом поясе площадки, приведённая к UTC.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub seat_id: i64,
    pub user_name: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Бронь вместе с данными места - для отчётов и дашборда.
#[derive(Debug, Clone, FromRow)]
pub struct BookingWithSeat {
    pub id: i64,
    pub seat_id: i64,
    pub user_name: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub seat_row: i32,
    pub seat_col: i32,
    pub seat_label: String,
}
