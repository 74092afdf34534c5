//! Request-level errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::command::CommandError;
use crate::payment::PaymentError;
use crate::session::SessionError;
use crate::snapshot::OverlayError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Device id not in the configured set
    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// Payment processor refused or could not be reached
    #[error("Payment processor error: {0}")]
    PaymentProcessor(#[from] PaymentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::UnknownDevice(id) => AppError::InvalidDevice(id),
        }
    }
}

impl From<CommandError> for AppError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::InvalidDirection(d) => AppError::InvalidDirection(d.0),
            CommandError::UnknownDevice(id) => AppError::InvalidDevice(id),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AppError::InvalidDevice(id) => (
                StatusCode::BAD_REQUEST,
                "INVALID_DEVICE",
                format!("Invalid device: {}", id),
            ),
            AppError::InvalidDirection(d) => (
                StatusCode::BAD_REQUEST,
                "INVALID_DIRECTION",
                format!("Invalid direction: {}", d),
            ),
            // Processor details stay in the log
            AppError::PaymentProcessor(_) => (
                StatusCode::BAD_GATEWAY,
                "PAYMENT_PROCESSOR_ERROR",
                "Transaction failed".to_string(),
            ),
            AppError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                e.to_string(),
            ),
            AppError::Overlay(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OVERLAY_ERROR",
                e.to_string(),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error_code = %error_code,
                error = %self,
                "Request error"
            );
        } else {
            tracing::debug!(status = %status, error_code = %error_code, "Request rejected");
        }

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
