use crate::checkout::error::CheckoutError;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Resolution state of one payment attempt as reported by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Pending,
    Success,
    Failed,
}

impl TransactionState {
    /// Maps the gateway's wire status. Anything outside the documented set is
    /// treated as failed.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "pending" => TransactionState::Pending,
            "success" => TransactionState::Success,
            _ => TransactionState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    pub amount: String,
    pub currency: String,
}

impl Money {
    pub fn validate_positive(&self, field: &str) -> Result<(), CheckoutError> {
        let parsed = BigDecimal::from_str(&self.amount)
            .map_err(|_| CheckoutError::validation(field, format!("invalid amount: {}", self.amount)))?;
        if parsed <= BigDecimal::from(0) {
            return Err(CheckoutError::validation(
                field,
                "amount must be greater than zero",
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(CheckoutError::validation("currency", "currency is required"));
        }
        Ok(())
    }
}

/// Outcome of one finalize/status call against the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub state: TransactionState,
    pub amount: Option<Money>,
    pub failure_reason: Option<String>,
}

/// Session details resolved from a short-lived checkout token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetails {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl SessionDetails {
    /// Preset amount as a display string, if the gateway pinned one.
    pub fn amount_display(&self) -> Option<String> {
        match self.amount.as_ref()? {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// The in-memory checkout session for one payment attempt. Created when a
/// page loads with a token, edited only through the payer-facing fields, and
/// dropped on teardown.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub session_token: String,
    pub merchant_id: Option<String>,
    pub currency: String,
    pub amount: Option<String>,
    pub payer_first_name: String,
    pub payer_last_name: String,
    pub phone_country_code: String,
    pub phone_number: String,
    pub narration: Option<String>,
    pub mode: Option<String>,
    pub username: Option<String>,
}

impl PaymentSession {
    pub fn from_details(token: &str, details: &SessionDetails) -> Self {
        Self {
            session_token: token.to_string(),
            merchant_id: details.merchant_id.clone(),
            currency: details.currency.clone().unwrap_or_else(|| "USD".to_string()),
            amount: details.amount_display(),
            payer_first_name: String::new(),
            payer_last_name: String::new(),
            phone_country_code: "+234".to_string(),
            phone_number: String::new(),
            narration: None,
            mode: details.mode.clone(),
            username: details.username.clone(),
        }
    }
}

/// Card data held only in form state: submitted once and discarded, never
/// persisted. `Debug` masks the PAN and hides the CVC so the struct can be
/// traced safely.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvc: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &crate::logging::mask_card_number(&self.number))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvc", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Payload for `POST /checkout/submit`: payer identity plus card fields. The
/// expiry year travels as four digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSubmission {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    pub country_code: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub currency: String,
    pub amount: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The three outcome shapes of a card submission, in the order the caller
/// must honor: challenge, then redirect, then immediate finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Opaque 3-D Secure challenge markup to render, plus the reference to
    /// finalize once the challenge completes.
    ThreeDsChallenge {
        html: String,
        transaction_reference: Option<String>,
    },
    /// Hand the payer off to an external payment page.
    Redirect { url: String },
    /// No challenge step; the reference can be finalized immediately.
    Finalize { transaction_reference: String },
}

/// Raw wire shape of the submit response. The gateway sets at most one of the
/// outcome fields; [`SubmitResponseRaw::into_outcome`] resolves the priority
/// order once, at the boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponseRaw {
    #[serde(default)]
    pub three_ds_html: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub transaction_reference: Option<String>,
}

impl SubmitResponseRaw {
    pub fn into_outcome(self) -> Result<SubmitOutcome, CheckoutError> {
        if let Some(html) = self.three_ds_html {
            return Ok(SubmitOutcome::ThreeDsChallenge {
                html,
                transaction_reference: self.transaction_reference,
            });
        }
        if let Some(url) = self.payment_url.or(self.redirect_url) {
            return Ok(SubmitOutcome::Redirect { url });
        }
        if let Some(reference) = self.transaction_reference {
            return Ok(SubmitOutcome::Finalize {
                transaction_reference: reference,
            });
        }
        Err(CheckoutError::InvalidResponse {
            message: "submit response carried no challenge, redirect or reference".to_string(),
        })
    }
}

/// Raw wire shape of a finalize/status response.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatusRaw {
    pub status: String,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TransactionStatusRaw {
    pub fn into_status(self) -> TransactionStatus {
        let state = TransactionState::from_wire(&self.status);
        let amount = match (&self.amount, &self.currency) {
            (Some(amount), Some(currency)) => {
                let amount = match amount {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some(Money {
                    amount,
                    currency: currency.clone(),
                })
            }
            _ => None,
        };
        TransactionStatus {
            state,
            amount,
            failure_reason: if state == TransactionState::Failed {
                self.message
            } else {
                None
            },
        }
    }
}

/// Merchant display metadata for the hosted page header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDetails {
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Request for the alternate (tip/collection) flow: the gateway hosts the
/// payment page and calls back with a transaction reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRequest {
    pub amount: Money,
    pub merchant_id: String,
    pub client_id: String,
    pub method: String,
    pub country_code: String,
    pub redirect_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub customer: CustomerInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInitiated {
    pub payment_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionFinalizeRequest {
    pub transaction_reference: String,
    pub client_id: String,
}

/// Standard envelope the gateway wraps response payloads in.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}
