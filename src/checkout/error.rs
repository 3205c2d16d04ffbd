use thiserror::Error;

pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Errors produced by the checkout flow and the gateway client.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    /// Field-level form validation failure; stays in the form view.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The session token is missing, expired or unknown to the gateway.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The gateway could not be reached or the connection dropped mid-call.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The gateway rejected the payment.
    #[error("Payment declined: {message}")]
    Declined {
        message: String,
        gateway_code: Option<String>,
    },

    /// The gateway answered with a non-success status outside the cases above.
    #[error("Gateway error: {message}")]
    Gateway {
        message: String,
        status: Option<u16>,
    },

    /// The gateway answered 2xx but the body did not match any expected shape.
    #[error("Invalid gateway response: {message}")]
    InvalidResponse { message: String },

    /// A flow-level precondition was violated (e.g. submitting while a poll
    /// is outstanding).
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl CheckoutError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CheckoutError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Validation { .. } => false,
            CheckoutError::NotFound { .. } => false,
            CheckoutError::Network { .. } => true,
            CheckoutError::Declined { .. } => false,
            CheckoutError::Gateway { status, .. } => {
                matches!(status, Some(s) if *s >= 500)
            }
            CheckoutError::InvalidResponse { .. } => false,
            CheckoutError::InvalidState { .. } => false,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            CheckoutError::Validation { .. } => 400,
            CheckoutError::NotFound { .. } => 404,
            CheckoutError::Network { .. } => 503,
            CheckoutError::Declined { .. } => 402,
            CheckoutError::Gateway { .. } => 502,
            CheckoutError::InvalidResponse { .. } => 502,
            CheckoutError::InvalidState { .. } => 409,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Validation { message, .. } => message.clone(),
            CheckoutError::NotFound { .. } => {
                "This payment link is invalid or has expired".to_string()
            }
            CheckoutError::Network { .. } => {
                "The payment service is temporarily unavailable".to_string()
            }
            CheckoutError::Declined { message, .. } => {
                if message.is_empty() {
                    "Payment was declined".to_string()
                } else {
                    message.clone()
                }
            }
            CheckoutError::Gateway { .. } | CheckoutError::InvalidResponse { .. } => {
                "The payment service returned an error".to_string()
            }
            CheckoutError::InvalidState { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(
            CheckoutError::validation("amount", "bad").http_status_code(),
            400
        );
        assert_eq!(
            CheckoutError::NotFound {
                message: "no such token".to_string()
            }
            .http_status_code(),
            404
        );
        assert_eq!(
            CheckoutError::Declined {
                message: "insufficient funds".to_string(),
                gateway_code: None
            }
            .http_status_code(),
            402
        );
    }

    #[test]
    fn retryable_flags() {
        assert!(CheckoutError::Network {
            message: "timeout".to_string()
        }
        .is_retryable());
        assert!(!CheckoutError::Declined {
            message: "declined".to_string(),
            gateway_code: None
        }
        .is_retryable());
        assert!(CheckoutError::Gateway {
            message: "upstream".to_string(),
            status: Some(502)
        }
        .is_retryable());
        assert!(!CheckoutError::Gateway {
            message: "bad request".to_string(),
            status: Some(400)
        }
        .is_retryable());
    }
}
