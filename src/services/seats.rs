//! seats.rs
//!
//! Управление рассадкой: список мест, перегенерация сетки, правка подписи.
//!
//! Перегенерация - разрушительная операция: старые места удаляются целиком,
//! их брони уходят каскадом, затем создается полная новая сетка.

use sqlx::PgPool;

use crate::errors::{ApiError, ApiResult};
use crate::models::Seat;

/// Все места в порядке рассадки (ряд, колонка).
pub async fn list_seats(pool: &PgPool) -> ApiResult<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>(
        r#"SELECT id, "row", col, label FROM seats ORDER BY "row", col"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(seats)
}

/// Сносит текущую рассадку и создает сетку rows × cols с подписями
/// A1, A2, ..., B1, ... - буква ряда плюс номер колонки.
pub async fn regenerate_layout(pool: &PgPool, rows: i32, cols: i32) -> ApiResult<Vec<Seat>> {
    // Подпись ряда - одна латинская буква, поэтому рядов не больше 26
    if !(1..=26).contains(&rows) {
        return Err(ApiError::validation("rows должен быть от 1 до 26"));
    }
    if !(1..=100).contains(&cols) {
        return Err(ApiError::validation("cols должен быть от 1 до 100"));
    }

    let mut tx = pool.begin().await?;

    // Брони старых мест удаляются каскадом
    sqlx::query("DELETE FROM seats").execute(&mut *tx).await?;

    let mut seats = Vec::with_capacity((rows * cols) as usize);
    for row in 1..=rows {
        for col in 1..=cols {
            let seat = sqlx::query_as::<_, Seat>(
                r#"INSERT INTO seats ("row", col, label)
                   VALUES ($1, $2, $3)
                   RETURNING id, "row", col, label"#,
            )
            .bind(row)
            .bind(col)
            .bind(grid_label(row, col))
            .fetch_one(&mut *tx)
            .await?;
            seats.push(seat);
        }
    }

    tx.commit().await?;
    Ok(seats)
}

/// Правка подписи места; позиция в сетке не меняется.
pub async fn update_label(pool: &PgPool, seat_id: i64, label: &str) -> ApiResult<Seat> {
    let label = label.trim();
    if label.is_empty() {
        return Err(ApiError::validation("label обязателен"));
    }

    sqlx::query_as::<_, Seat>(
        r#"UPDATE seats SET label = $1 WHERE id = $2 RETURNING id, "row", col, label"#,
    )
    .bind(label)
    .bind(seat_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Место не найдено"))
}

// Ряд 1 -> 'A', ряд 2 -> 'B'; колонка - номер с единицы.
fn grid_label(row: i32, col: i32) -> String {
    let letter = (b'A' + (row - 1) as u8) as char;
    format!("{letter}{col}")
}
