use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::features::payments::PaymentError;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Cache(ref e) => {
                tracing::error!("Cache error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Cache error occurred".to_string(),
                )
            }
            AppError::Payment(ref e) => match e {
                PaymentError::Signature(msg) => {
                    tracing::warn!(security = true, "Rejected webhook signature: {}", msg);
                    (
                        StatusCode::UNAUTHORIZED,
                        "Invalid webhook signature".to_string(),
                    )
                }
                PaymentError::UnsupportedProvider(msg) => {
                    (StatusCode::NOT_FOUND, format!("Unsupported provider: {}", msg))
                }
                PaymentError::MalformedEvent(msg) | PaymentError::InvalidRequest(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone())
                }
                PaymentError::Vendor(msg) => {
                    tracing::error!("Payment vendor error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Payment provider error".to_string(),
                    )
                }
            },
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "External service error".to_string(),
                )
            }
            AppError::RateLimitExceeded(ref msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::Timeout(ref msg) => {
                tracing::error!("Timed out: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Request timed out".to_string(),
                )
            }
        };

        let body = Json(ApiResponse::error(Some(message)));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
