//! Error types for PassHub server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::policy::{qr::QrError, SlotError};

/// Application error codes returned in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 5,
    Duplicate = 6,
    BadValue = 7,
    CapacityExceeded = 8,
    BookingClosed = 9,
    AlreadyCancelled = 10,
    InvalidPassCode = 11,
    PaymentFailure = 12,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Booking closed: {0}")]
    BookingClosed(String),

    #[error("Capacity exceeded: {requested} requested, {remaining} remaining")]
    CapacityExceeded { requested: u32, remaining: u32 },

    #[error("Pass already cancelled")]
    AlreadyCancelled,

    #[error("Invalid pass code: {0}")]
    InvalidPassCode(#[from] QrError),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::NoGuests => AppError::Validation(err.to_string()),
            SlotError::CapacityExceeded { requested, remaining } => {
                AppError::CapacityExceeded { requested, remaining }
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::Failure, msg.clone())
            }
            AppError::BookingClosed(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::BookingClosed, msg.clone())
            }
            AppError::CapacityExceeded { .. } => {
                (StatusCode::CONFLICT, ErrorCode::CapacityExceeded, self.to_string())
            }
            AppError::AlreadyCancelled => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyCancelled, self.to_string())
            }
            AppError::InvalidPassCode(e) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidPassCode, e.to_string())
            }
            AppError::PaymentGateway(msg) => {
                tracing::warn!("Payment gateway error: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorCode::PaymentFailure, msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Authorization("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::AlreadyCancelled, StatusCode::CONFLICT),
            (AppError::BookingClosed("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::PaymentGateway("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_slot_error_conversion() {
        let err: AppError = SlotError::CapacityExceeded { requested: 4, remaining: 1 }.into();
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, ErrorCode::CapacityExceeded);
        assert!(message.contains("4 requested"));

        let err: AppError = SlotError::NoGuests.into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_error_codes_in_body() {
        let (_, code, _) = AppError::AlreadyCancelled.parts();
        assert_eq!(code as u32, 10);
        let (_, code, _) = AppError::Validation("x".into()).parts();
        assert_eq!(code as u32, 7);
        let (_, code, _) = AppError::NotFound("x".into()).parts();
        assert_eq!(code as u32, 5);
    }

    #[test]
    fn test_internal_message_hidden() {
        let (_, _, message) = AppError::Internal("secret detail".into()).parts();
        assert_eq!(message, "Internal server error");
    }
}
