use crate::checkout::error::{CheckoutError, CheckoutResult};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Thin JSON client for the payment gateway. Calls are one-shot: retry policy
/// belongs to the status resolver, not the transport.
#[derive(Clone)]
pub struct GatewayHttpClient {
    client: Client,
    timeout: Duration,
}

impl GatewayHttpClient {
    pub fn new(timeout: Duration) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckoutError::Network {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;
        Ok(Self { client, timeout })
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        bearer_token: Option<&str>,
        body: Option<&JsonValue>,
    ) -> CheckoutResult<T> {
        let mut request = self.client.request(method, url).timeout(self.timeout);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }
        request = request.header("Accept", "application/json");
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| CheckoutError::Network {
            message: format!("gateway request failed: {}", e),
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return serde_json::from_str::<T>(&text).map_err(|e| CheckoutError::InvalidResponse {
                message: format!("invalid gateway JSON response: {}", e),
            });
        }

        Err(classify_error(status, &text))
    }
}

/// Maps a non-2xx gateway answer onto the checkout error taxonomy, pulling a
/// human-readable message out of the error body when one is present.
fn classify_error(status: StatusCode, body: &str) -> CheckoutError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::NOT_FOUND => CheckoutError::NotFound { message },
        StatusCode::PAYMENT_REQUIRED => CheckoutError::Declined {
            message,
            gateway_code: Some(status.as_u16().to_string()),
        },
        _ => CheckoutError::Gateway {
            message,
            status: Some(status.as_u16()),
        },
    }
}

/// Best-effort message extraction: `message`, then `error.message`, then a
/// bare string `error`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let parsed: JsonValue = serde_json::from_str(body).ok()?;
    if let Some(message) = parsed.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }
    if let Some(message) = parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
    {
        return Some(message.to_string());
    }
    parsed
        .get("error")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}
