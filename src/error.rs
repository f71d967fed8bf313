use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::SqlErr;
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input: empty removal list, item id not in the bag, bad window.
    #[error("{0}")]
    Validation(String),

    /// Business-rule breach: duplicate establishment/day in a cart,
    /// reservation exclusivity, removal cap, personalizing a surprise bag.
    #[error("{0}")]
    Constraint(String),

    #[error("Not Found")]
    NotFound,

    /// State that changed underneath the caller: bag unavailable or pickup
    /// window already over by the time the write happens.
    #[error("{0}")]
    Conflict(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// The cart and reservation invariants are backed by unique indexes, so a
/// unique-violation coming back from Postgres is an authoritative rule
/// rejection, not a storage failure. Everything else stays an OrmError.
pub fn on_unique_violation(err: sea_orm::DbErr, reject: impl FnOnce() -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => reject(),
        _ => AppError::OrmError(err),
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Constraint(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::OrmError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
