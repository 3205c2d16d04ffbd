//! Local payment submission endpoint.
//!
//! Validates the fixed field set and simulates processing. The simulation is
//! deterministic: a card number that passes the Luhn check clears, anything
//! else is declined with a 402.

use crate::card;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;

const REQUIRED_FIELDS: &[&str] = &[
    "currency",
    "amount",
    "first_name",
    "last_name",
    "email",
    "phone_number",
    "card_number",
    "expiry_month",
    "expiry_year",
    "cvc",
];

#[derive(Debug, Serialize)]
struct PaymentAccepted {
    success: bool,
    transaction_id: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct PaymentRejected {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

pub async fn submit_payment(Json(body): Json<JsonValue>) -> Response {
    for field in REQUIRED_FIELDS {
        if is_missing(body.get(field)) {
            return (
                StatusCode::BAD_REQUEST,
                Json(PaymentRejected {
                    error: ErrorDetail {
                        code: "MISSING_FIELD".to_string(),
                        message: format!("Missing required field: {}", field),
                        field: Some(field.to_string()),
                    },
                }),
            )
                .into_response();
        }
    }

    let card_number = body
        .get("card_number")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if !card::is_valid_card_number(card_number) {
        return (
            StatusCode::PAYMENT_REQUIRED,
            Json(PaymentRejected {
                error: ErrorDetail {
                    code: "PAYMENT_DECLINED".to_string(),
                    message: "Payment declined".to_string(),
                    field: None,
                },
            }),
        )
            .into_response();
    }

    let transaction_id = format!("TXN_{}", Uuid::new_v4().simple());
    info!(transaction_id = %transaction_id, "simulated payment accepted");

    (
        StatusCode::OK,
        Json(PaymentAccepted {
            success: true,
            transaction_id,
            message: "Payment processed successfully".to_string(),
        }),
    )
        .into_response()
}

/// A field counts as missing when it is absent, null, an empty string or a
/// zero amount.
fn is_missing(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(JsonValue::Number(n)) => n.as_f64() == Some(0.0),
        Some(JsonValue::Bool(b)) => !b,
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_detection_matches_contract() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&JsonValue::Null)));
        assert!(is_missing(Some(&serde_json::json!(""))));
        assert!(is_missing(Some(&serde_json::json!(0))));
        assert!(!is_missing(Some(&serde_json::json!("USD"))));
        assert!(!is_missing(Some(&serde_json::json!(10.5))));
    }
}
