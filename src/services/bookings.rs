//! bookings.rs
//!
//! Разрешение конфликтов бронирования.
//!
//! Инвариант системы: на пару (место, день) - не больше одной брони.
//! Многодневная бронь разворачивается в отдельную строку на каждый день,
//! поэтому инвариант остается поштучным и проверяется одним запросом.
//!
//! Предварительная проверка занятости нужна только для дружелюбного ответа
//! со списком занятых дней; сам инвариант держит уникальный индекс
//! (seat_id, date) - гонка двух одновременных запросов упирается в 23505.

use chrono_tz::Tz;
use sqlx::PgPool;

use crate::errors::{ApiError, ApiResult};
use crate::models::{Booking, BookingWithSeat};
use crate::timezone;

/* ---------- создание ---------- */

/// Бронь на один день. Пара (место, день) должна быть свободна.
pub async fn create_single_day(
    pool: &PgPool,
    tz: Tz,
    seat_id: i64,
    date: &str,
    user_name: &str,
) -> ApiResult<Booking> {
    let user_name = validate_user_name(user_name)?;
    let date = timezone::parse_to_canonical_instant(tz, date)?;

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Booking>(
        "SELECT id, seat_id, user_name, date, created_at
         FROM bookings WHERE seat_id = $1 AND date = $2",
    )
    .bind(seat_id)
    .bind(date)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(existing) = existing {
        return Err(ApiError::conflict(
            format!(
                "Место уже забронировано на {}",
                timezone::format_for_api(tz, date)
            ),
            vec![existing],
        ));
    }

    let created = sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (seat_id, user_name, date)
         VALUES ($1, $2, $3)
         RETURNING id, seat_id, user_name, date, created_at",
    )
    .bind(seat_id)
    .bind(user_name)
    .bind(date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(created)
}

/// Бронь на непрерывный диапазон дней включительно, всё-или-ничего:
/// при любом занятом дне не создается ни одной строки.
pub async fn create_range(
    pool: &PgPool,
    tz: Tz,
    seat_id: i64,
    start_date: &str,
    end_date: &str,
    user_name: &str,
) -> ApiResult<Vec<Booking>> {
    let user_name = validate_user_name(user_name)?;
    let start = timezone::parse_to_canonical_instant(tz, start_date)?;
    let end = timezone::parse_to_canonical_instant(tz, end_date)?;

    if end < start {
        return Err(ApiError::validation("endDate раньше startDate"));
    }

    let days = timezone::enumerate_days(tz, start, end);
    if days.is_empty() {
        return Err(ApiError::InvalidDate(start_date.to_string()));
    }

    let mut tx = pool.begin().await?;

    let conflicts = sqlx::query_as::<_, Booking>(
        "SELECT id, seat_id, user_name, date, created_at
         FROM bookings
         WHERE seat_id = $1 AND date >= $2 AND date <= $3
         ORDER BY date ASC",
    )
    .bind(seat_id)
    .bind(start)
    .bind(end)
    .fetch_all(&mut *tx)
    .await?;

    if !conflicts.is_empty() {
        // Детерминированно сообщаем самый ранний занятый день
        let first_day = timezone::format_for_api(tz, conflicts[0].date);
        return Err(ApiError::conflict(
            format!("Место уже забронировано на {first_day}"),
            conflicts,
        ));
    }

    let mut created = Vec::with_capacity(days.len());
    for day in days {
        // Ошибка любой вставки откатывает весь диапазон
        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (seat_id, user_name, date)
             VALUES ($1, $2, $3)
             RETURNING id, seat_id, user_name, date, created_at",
        )
        .bind(seat_id)
        .bind(user_name)
        .bind(day)
        .fetch_one(&mut *tx)
        .await?;
        created.push(booking);
    }

    tx.commit().await?;
    Ok(created)
}

/* ---------- изменение и удаление ---------- */

/// Правка брони: имя, дата или и то и другое. Смена даты повторяет проверку
/// занятости, исключая саму бронь; правка только имени проверок не делает.
pub async fn update_booking(
    pool: &PgPool,
    tz: Tz,
    id: i64,
    user_name: Option<&str>,
    date: Option<&str>,
) -> ApiResult<Booking> {
    if user_name.is_none() && date.is_none() {
        return Err(ApiError::validation(
            "Нужно передать userName или date",
        ));
    }
    let user_name = user_name.map(validate_user_name).transpose()?;

    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Booking>(
        "SELECT id, seat_id, user_name, date, created_at FROM bookings WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Бронирование не найдено"))?;

    let new_date = match date {
        Some(raw) => {
            let normalized = timezone::parse_to_canonical_instant(tz, raw)?;
            let clash = sqlx::query_as::<_, Booking>(
                "SELECT id, seat_id, user_name, date, created_at
                 FROM bookings
                 WHERE seat_id = $1 AND date = $2 AND id <> $3",
            )
            .bind(current.seat_id)
            .bind(normalized)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(clash) = clash {
                return Err(ApiError::conflict(
                    format!(
                        "Место уже забронировано на {}",
                        timezone::format_for_api(tz, normalized)
                    ),
                    vec![clash],
                ));
            }
            normalized
        }
        None => current.date,
    };

    let updated = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET user_name = $1, date = $2
         WHERE id = $3
         RETURNING id, seat_id, user_name, date, created_at",
    )
    .bind(user_name.unwrap_or(&current.user_name))
    .bind(new_date)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

pub async fn delete_booking(pool: &PgPool, id: i64) -> ApiResult<()> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Бронирование не найдено"));
    }
    Ok(())
}

/* ---------- отчеты ---------- */

/// Брони одного календарного дня вместе с местами, в порядке рассадки.
pub async fn bookings_for_day(
    pool: &PgPool,
    tz: Tz,
    date: &str,
) -> ApiResult<Vec<BookingWithSeat>> {
    let day = timezone::parse_to_canonical_instant(tz, date)?;

    let rows = sqlx::query_as::<_, BookingWithSeat>(
        r#"SELECT b.id, b.seat_id, b.user_name, b.date, b.created_at,
                  s."row" AS seat_row, s.col AS seat_col, s.label AS seat_label
           FROM bookings b
           JOIN seats s ON s.id = b.seat_id
           WHERE b.date = $1
           ORDER BY s."row", s.col"#,
    )
    .bind(day)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Брони отрезка `[startDate, endDate]` включительно, по возрастанию даты.
pub async fn bookings_in_range(
    pool: &PgPool,
    tz: Tz,
    start_date: &str,
    end_date: &str,
) -> ApiResult<Vec<BookingWithSeat>> {
    let start = timezone::parse_to_canonical_instant(tz, start_date)?;
    let end = timezone::parse_to_canonical_instant(tz, end_date)?;

    if end < start {
        return Err(ApiError::validation("endDate раньше startDate"));
    }

    let rows = sqlx::query_as::<_, BookingWithSeat>(
        r#"SELECT b.id, b.seat_id, b.user_name, b.date, b.created_at,
                  s."row" AS seat_row, s.col AS seat_col, s.label AS seat_label
           FROM bookings b
           JOIN seats s ON s.id = b.seat_id
           WHERE b.date >= $1 AND b.date <= $2
           ORDER BY b.date, s."row", s.col"#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

fn validate_user_name(user_name: &str) -> ApiResult<&str> {
    let trimmed = user_name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("userName обязателен"));
    }
    Ok(trimmed)
}
