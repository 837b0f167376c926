//! errors.rs
//!
//! Единый тип ошибок приложения и его отображение в HTTP-ответ.
//!
//! Обработчики возвращают `Result<_, ApiError>`; все коды статусов
//! назначаются здесь, а не в контроллерах.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::Booking;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Отсутствует или некорректно обязательное поле запроса.
    #[error("{0}")]
    Validation(String),

    /// Дату из запроса не удалось разобрать.
    #[error("Некорректная дата: {0}")]
    InvalidDate(String),

    /// Нарушение уникальности (место, день). Вместе с сообщением отдаем
    /// конфликтующие брони, чтобы клиент мог показать занятые дни.
    #[error("{message}")]
    Conflict {
        message: String,
        conflicts: Vec<Booking>,
    },

    /// Запрошенная сущность отсутствует.
    #[error("{0}")]
    NotFound(String),

    /// Неожиданная ошибка хранилища.
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>, conflicts: Vec<Booking>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            conflicts,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(err) => classify_sqlx_error(err).0,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Conflict { message, conflicts } => (
                StatusCode::CONFLICT,
                json!({ "error": message, "conflicts": conflicts }),
            ),
            ApiError::Storage(err) => {
                let (status, message) = classify_sqlx_error(err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("storage error: {:?}", err);
                }
                (status, json!({ "error": message }))
            }
            other => (other.status_code(), json!({ "error": other.to_string() })),
        };

        (status, Json(body)).into_response()
    }
}

/// Классифицирует ошибку sqlx: нарушение уникальности по (seat_id, date)
/// превращается в 409, нарушение внешнего ключа - в 404 (место удалено),
/// остальное - 500 без деталей наружу.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "Запись не найдена".to_string(),
        ),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // 23505 - unique_violation: гонка двух одновременных броней
            Some("23505") => (
                StatusCode::CONFLICT,
                "Место уже забронировано на эту дату".to_string(),
            ),
            // 23503 - foreign_key_violation: место успели удалить
            Some("23503") => (
                StatusCode::NOT_FOUND,
                "Место не найдено".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Внутренняя ошибка сервера".to_string(),
            ),
        },
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Внутренняя ошибка сервера".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err = ApiError::validation("userName обязателен");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_date_maps_to_400() {
        let err = ApiError::InvalidDate("not-a-date".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError::conflict("занято", vec![]);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::not_found("Бронирование не найдено");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = ApiError::Storage(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
