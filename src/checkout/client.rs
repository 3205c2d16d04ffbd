use crate::checkout::error::{CheckoutError, CheckoutResult};
use crate::checkout::http::GatewayHttpClient;
use crate::checkout::types::{
    CardSubmission, ClientDetails, CollectionFinalizeRequest, CollectionInitiated,
    CollectionRequest, GatewayEnvelope, SessionDetails, SubmitOutcome, SubmitResponseRaw,
    TransactionStatus, TransactionStatusRaw,
};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Supplies the bearer token attached to gateway requests. Passed to the
/// client at construction instead of living in a process-wide interceptor, so
/// every call site can see where its credentials come from.
pub trait AuthTokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token provider for unauthenticated (public checkout) traffic.
pub struct NoAuth;

impl AuthTokenProvider for NoAuth {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Token provider backed by a fixed credential from configuration.
pub struct StaticToken(pub String);

impl AuthTokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CheckoutClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.example-gateway.com".to_string(),
            timeout_secs: 45,
        }
    }
}

impl CheckoutClientConfig {
    pub fn from_env() -> CheckoutResult<Self> {
        let base_url = std::env::var("GATEWAY_BASE_URL").map_err(|_| {
            CheckoutError::validation("GATEWAY_BASE_URL", "GATEWAY_BASE_URL is required")
        })?;
        Ok(Self {
            base_url,
            timeout_secs: std::env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(45),
        })
    }
}

/// Typed client for the remote payment-processing backend. Each operation is
/// a single network call; the caller decides what to do with failures.
pub struct CheckoutClient {
    config: CheckoutClientConfig,
    http: GatewayHttpClient,
    tokens: Arc<dyn AuthTokenProvider>,
}

impl CheckoutClient {
    pub fn new(
        config: CheckoutClientConfig,
        tokens: Arc<dyn AuthTokenProvider>,
    ) -> CheckoutResult<Self> {
        let http = GatewayHttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn token(&self) -> Option<String> {
        self.tokens.bearer_token()
    }

    /// Resolves a short-lived checkout token into session details.
    pub async fn verify_token(&self, token: &str) -> CheckoutResult<SessionDetails> {
        if token.trim().is_empty() {
            return Err(CheckoutError::NotFound {
                message: "checkout token is missing".to_string(),
            });
        }
        let envelope: GatewayEnvelope<SessionDetails> = self
            .http
            .request_json(
                Method::GET,
                &self.endpoint(&format!("/checkout/verify-token?token={}", token)),
                self.token().as_deref(),
                None,
            )
            .await?;
        Ok(envelope.data)
    }

    /// Submits payer and card fields. The response is decoded into a tagged
    /// [`SubmitOutcome`] in challenge → redirect → finalize priority order.
    pub async fn submit_card_details(
        &self,
        submission: &CardSubmission,
    ) -> CheckoutResult<SubmitOutcome> {
        let payload = serde_json::to_value(submission).map_err(|e| CheckoutError::Validation {
            message: format!("unserializable submission: {}", e),
            field: None,
        })?;
        let envelope: GatewayEnvelope<SubmitResponseRaw> = self
            .http
            .request_json(
                Method::POST,
                &self.endpoint("/checkout/submit"),
                self.token().as_deref(),
                Some(&payload),
            )
            .await?;
        let outcome = envelope.data.into_outcome()?;
        info!(
            card = %crate::logging::mask_card_number(&submission.card_number),
            currency = %submission.currency,
            "card details submitted"
        );
        Ok(outcome)
    }

    /// Queries/advances the gateway's resolution of one transaction.
    pub async fn finalize_card_payment(
        &self,
        transaction_reference: &str,
    ) -> CheckoutResult<TransactionStatus> {
        let payload = serde_json::json!({
            "transaction_reference": transaction_reference,
        });
        let envelope: GatewayEnvelope<TransactionStatusRaw> = self
            .http
            .request_json(
                Method::POST,
                &self.endpoint("/card-payment/finalize"),
                self.token().as_deref(),
                Some(&payload),
            )
            .await?;
        Ok(envelope.data.into_status())
    }

    /// Fetches merchant display metadata for the hosted page.
    pub async fn client_details(&self, client_id: &str) -> CheckoutResult<ClientDetails> {
        let envelope: GatewayEnvelope<ClientDetails> = self
            .http
            .request_json(
                Method::GET,
                &self.endpoint(&format!("/payment-gateway/client/{}", client_id)),
                self.token().as_deref(),
                None,
            )
            .await?;
        Ok(envelope.data)
    }

    /// Starts the alternate collection flow; the gateway answers with a
    /// hosted payment URL to hand the payer to.
    pub async fn initiate_collection(
        &self,
        request: &CollectionRequest,
    ) -> CheckoutResult<CollectionInitiated> {
        request.amount.validate_positive("amount")?;
        let payload = serde_json::to_value(request).map_err(|e| CheckoutError::Validation {
            message: format!("unserializable collection request: {}", e),
            field: None,
        })?;
        let envelope: GatewayEnvelope<CollectionInitiated> = self
            .http
            .request_json(
                Method::POST,
                &self.endpoint("/payment-gateway/collections/initiate"),
                self.token().as_deref(),
                Some(&payload),
            )
            .await?;
        Ok(envelope.data)
    }

    /// Finalizes a collection-flow transaction; same pending/success/failed
    /// contract as the card path.
    pub async fn finalize_collection(
        &self,
        request: &CollectionFinalizeRequest,
    ) -> CheckoutResult<TransactionStatus> {
        let payload = serde_json::to_value(request).map_err(|e| CheckoutError::Validation {
            message: format!("unserializable finalize request: {}", e),
            field: None,
        })?;
        let envelope: GatewayEnvelope<TransactionStatusRaw> = self
            .http
            .request_json(
                Method::POST,
                &self.endpoint("/payment-gateway/collections/finalize"),
                self.token().as_deref(),
                Some(&payload),
            )
            .await?;
        Ok(envelope.data.into_status())
    }
}

/// Seam the flow controller talks to the gateway through, so tests can
/// substitute a scripted backend.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn verify_token(&self, token: &str) -> CheckoutResult<SessionDetails>;

    async fn submit_card_details(
        &self,
        submission: &CardSubmission,
    ) -> CheckoutResult<SubmitOutcome>;

    async fn finalize_card_payment(
        &self,
        transaction_reference: &str,
    ) -> CheckoutResult<TransactionStatus>;
}

#[async_trait]
impl CheckoutBackend for CheckoutClient {
    async fn verify_token(&self, token: &str) -> CheckoutResult<SessionDetails> {
        CheckoutClient::verify_token(self, token).await
    }

    async fn submit_card_details(
        &self,
        submission: &CardSubmission,
    ) -> CheckoutResult<SubmitOutcome> {
        CheckoutClient::submit_card_details(self, submission).await
    }

    async fn finalize_card_payment(
        &self,
        transaction_reference: &str,
    ) -> CheckoutResult<TransactionStatus> {
        CheckoutClient::finalize_card_payment(self, transaction_reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_and_env_fallbacks() {
        let config = CheckoutClientConfig::default();
        assert_eq!(config.timeout_secs, 45);
        assert!(!config.base_url.is_empty());
    }

    #[test]
    fn client_builds_with_injected_token_provider() {
        let client = CheckoutClient::new(
            CheckoutClientConfig::default(),
            Arc::new(StaticToken("tok_test".to_string())),
        )
        .expect("client init");
        assert_eq!(client.token().as_deref(), Some("tok_test"));
        assert_eq!(
            client.endpoint("/checkout/submit"),
            "https://api.example-gateway.com/checkout/submit"
        );
    }

    #[tokio::test]
    async fn empty_token_short_circuits_to_not_found() {
        let client =
            CheckoutClient::new(CheckoutClientConfig::default(), Arc::new(NoAuth)).expect("client");
        let result = client.verify_token("  ").await;
        assert!(matches!(result, Err(CheckoutError::NotFound { .. })));
    }
}
