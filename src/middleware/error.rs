//! Standardized JSON error responses.

use crate::checkout::error::CheckoutError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Machine-readable error codes for client handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "NETWORK_ERROR")]
    NetworkError,
    #[serde(rename = "PAYMENT_DECLINED")]
    PaymentDeclined,
    #[serde(rename = "GATEWAY_ERROR")]
    GatewayError,
    #[serde(rename = "INVALID_STATE")]
    InvalidState,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

/// Error body returned to clients for all error cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    pub fn from_checkout_error(error: &CheckoutError) -> Self {
        let code = match error {
            CheckoutError::Validation { .. } => ErrorCode::ValidationError,
            CheckoutError::NotFound { .. } => ErrorCode::NotFound,
            CheckoutError::Network { .. } => ErrorCode::NetworkError,
            CheckoutError::Declined { .. } => ErrorCode::PaymentDeclined,
            CheckoutError::Gateway { .. } | CheckoutError::InvalidResponse { .. } => {
                ErrorCode::GatewayError
            }
            CheckoutError::InvalidState { .. } => ErrorCode::InvalidState,
        };
        let details = match error {
            CheckoutError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };
        Self {
            error: code,
            message: error.user_message(),
            timestamp: Utc::now().to_rfc3339(),
            details,
            retryable: Some(error.is_retryable()),
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "server error");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "client error");
        }

        (status, Json(ErrorResponse::from_checkout_error(&self))).into_response()
    }
}

/// Standard success envelope for handler responses.
pub fn success_response<T: Serialize>(data: T) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "data": data,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_errors_map_to_codes_and_statuses() {
        let declined = CheckoutError::Declined {
            message: "insufficient funds".to_string(),
            gateway_code: None,
        };
        let body = ErrorResponse::from_checkout_error(&declined);
        assert_eq!(body.error, ErrorCode::PaymentDeclined);
        assert_eq!(
            declined.into_response().status(),
            StatusCode::PAYMENT_REQUIRED
        );

        let validation = CheckoutError::validation("amount", "Amount must be greater than 0");
        let body = ErrorResponse::from_checkout_error(&validation);
        assert_eq!(body.error, ErrorCode::ValidationError);
        assert_eq!(body.details, Some(serde_json::json!({ "field": "amount" })));
    }
}
