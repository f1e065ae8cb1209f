use crate::models::ErrorResponse;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid adjustment: {0}")]
    InvalidAdjustment(String),

    #[error("Coupon rejected: {0}")]
    CouponRejected(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::InvalidAdjustment(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ADJUSTMENT", msg.clone())
            }
            AppError::CouponRejected(msg) => {
                (StatusCode::BAD_REQUEST, "COUPON_REJECTED", msg.clone())
            }
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone()),
            // 令牌校验失败不暴露细节
            AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "AUTH_ERROR",
                "Invalid access token".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden".to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = self.parts();
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidAdjustment(_)
            | AppError::CouponRejected(_)
            | AppError::Conflict(_) => log::warn!("{self}"),
            AppError::AuthError(_) | AppError::JwtError(_) => {
                log::warn!("Authentication error: {self}")
            }
            AppError::Forbidden => log::warn!("Forbidden access"),
            AppError::NotFound(_) => {}
            _ => log::error!("{self}"),
        }

        HttpResponse::build(status_code).json(ErrorResponse::new(error_code, &message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidAdjustment("Stock cannot be negative".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Product not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DatabaseError(sea_orm::DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_body_is_generic() {
        let (_, code, message) =
            AppError::DatabaseError(sea_orm::DbErr::Custom("password=hunter2".into())).parts();
        assert_eq!(code, "DATABASE_ERROR");
        assert_eq!(message, "Database error");
    }

    #[test]
    fn test_config_error_is_internal() {
        let (status, code, message) =
            AppError::ConfigError("DATABASE_URL is not set".into()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert_eq!(message, "Internal server error");
    }
}
