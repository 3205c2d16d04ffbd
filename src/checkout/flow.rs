//! Checkout flow control.
//!
//! Owns the state machine `Form → Pending → Success | Failed` plus the
//! transient 3-D Secure challenge sub-state, and routes challenge completion
//! back into the status resolver.

use crate::checkout::client::CheckoutBackend;
use crate::checkout::error::{CheckoutError, CheckoutResult};
use crate::checkout::resolver::{FailureReason, PaymentStatusResolver, Resolution, ResolverConfig};
use crate::checkout::types::{Money, PaymentSession, SubmitOutcome};
use crate::checkout::validation::{validate_payment_form, PaymentForm};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// View state of one checkout session.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Form,
    Pending,
    /// 3-D Secure challenge active; the resolver is suspended until the
    /// challenge signals completion.
    Challenge,
    Success { amount: Option<Money> },
    Failed,
    /// The checkout token was missing or unknown.
    NotFound,
}

/// What the caller should do after a submission was accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDisposition {
    /// Render the challenge markup from [`PaymentFlowController::challenge_html`].
    ChallengeRequired,
    /// Hand the payer off to an external payment page.
    RedirectTo(String),
    /// The attempt polled through to a terminal state.
    Resolved(FlowState),
}

/// Completion signal posted by the 3-DS challenge document. Either an
/// explicit completion marker or any status field counts as done.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeMessage {
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ChallengeMessage {
    pub fn indicates_completion(&self) -> bool {
        self.message_type.as_deref() == Some("3DS_COMPLETE") || self.status.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Origin challenge completion messages must carry; anything else is
    /// dropped.
    pub challenge_origin: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            challenge_origin: "https://api.example-gateway.com".to_string(),
        }
    }
}

impl FlowConfig {
    pub fn from_env() -> Self {
        Self {
            challenge_origin: std::env::var("CHECKOUT_CHALLENGE_ORIGIN")
                .unwrap_or_else(|_| Self::default().challenge_origin),
        }
    }
}

struct ActiveChallenge {
    html: String,
    transaction_reference: Option<String>,
}

/// Cancels the active resolution from outside the flow, e.g. on view
/// teardown. Dropping the controller has the same effect.
#[derive(Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

pub struct PaymentFlowController {
    backend: Arc<dyn CheckoutBackend>,
    resolver: PaymentStatusResolver,
    config: FlowConfig,
    state: FlowState,
    session: Option<PaymentSession>,
    active_challenge: Option<ActiveChallenge>,
    active_reference: Option<String>,
    last_failure: Option<FailureReason>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl PaymentFlowController {
    pub fn new(
        backend: Arc<dyn CheckoutBackend>,
        resolver_config: ResolverConfig,
        config: FlowConfig,
    ) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            resolver: PaymentStatusResolver::new(backend.clone(), resolver_config),
            backend,
            config,
            state: FlowState::Form,
            session: None,
            active_challenge: None,
            active_reference: None,
            last_failure: None,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn session(&self) -> Option<&PaymentSession> {
        self.session.as_ref()
    }

    pub fn last_failure(&self) -> Option<&FailureReason> {
        self.last_failure.as_ref()
    }

    pub fn challenge_html(&self) -> Option<&str> {
        self.active_challenge.as_ref().map(|c| c.html.as_str())
    }

    /// Reference of the attempt being (or last) resolved, e.g. for putting
    /// into a return URL.
    pub fn active_reference(&self) -> Option<&str> {
        self.active_reference.as_deref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel_tx.clone())
    }

    /// Bootstraps the flow from the page URL: a transaction reference means
    /// the payer navigated back mid-attempt and resolution resumes; a token
    /// starts a fresh session; neither is a dead link.
    pub async fn start(
        &mut self,
        token: Option<&str>,
        transaction_reference: Option<&str>,
    ) -> CheckoutResult<&FlowState> {
        if let Some(reference) = transaction_reference {
            self.run_resolution(reference.to_string()).await;
            return Ok(&self.state);
        }

        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            self.state = FlowState::NotFound;
            return Ok(&self.state);
        };

        match self.backend.verify_token(token).await {
            Ok(details) => {
                self.session = Some(PaymentSession::from_details(token, &details));
                self.state = FlowState::Form;
            }
            Err(e) => {
                warn!(error = %e, "token verification failed");
                self.state = FlowState::NotFound;
            }
        }
        Ok(&self.state)
    }

    /// Submits the payment form. Refused unless the flow is showing the form:
    /// one transaction reference is polled at a time, and a submission while
    /// a poll is outstanding would break that.
    pub async fn submit(&mut self, form: PaymentForm) -> CheckoutResult<SubmitDisposition> {
        if self.state != FlowState::Form {
            return Err(CheckoutError::InvalidState {
                message: "a payment attempt is already in progress".to_string(),
            });
        }
        let session = self.session.as_ref().ok_or(CheckoutError::InvalidState {
            message: "no verified checkout session".to_string(),
        })?;

        if let Err(errors) = validate_payment_form(&form) {
            return Err(errors.into_iter().next().expect("at least one error"));
        }

        let submission = form.to_submission(session);
        self.remember_payer_fields(&form);

        // Submission failures keep the form usable; the caller surfaces the
        // message and the payer edits and resubmits.
        let outcome = self.backend.submit_card_details(&submission).await?;

        match outcome {
            SubmitOutcome::ThreeDsChallenge {
                html,
                transaction_reference,
            } => {
                info!(has_reference = transaction_reference.is_some(), "3DS challenge received");
                self.active_challenge = Some(ActiveChallenge {
                    html,
                    transaction_reference,
                });
                self.state = FlowState::Challenge;
                Ok(SubmitDisposition::ChallengeRequired)
            }
            SubmitOutcome::Redirect { url } => Ok(SubmitDisposition::RedirectTo(url)),
            SubmitOutcome::Finalize {
                transaction_reference,
            } => {
                self.run_resolution(transaction_reference).await;
                Ok(SubmitDisposition::Resolved(self.state.clone()))
            }
        }
    }

    /// Routes a cross-document message from the challenge frame. Messages
    /// from any other origin are dropped. Returns whether the message closed
    /// the challenge.
    pub async fn handle_challenge_message(
        &mut self,
        origin: &str,
        message: &ChallengeMessage,
    ) -> CheckoutResult<bool> {
        if self.state != FlowState::Challenge {
            return Ok(false);
        }
        if origin != self.config.challenge_origin {
            warn!(origin, "challenge message from unexpected origin dropped");
            return Ok(false);
        }
        if !message.indicates_completion() {
            return Ok(false);
        }
        self.complete_challenge().await?;
        Ok(true)
    }

    /// Closes the 3-DS challenge. When a transaction reference is attached,
    /// finalize is invoked exactly once (the resolver's opening call) and
    /// resolution resumes; without one the flow returns to the form.
    pub async fn complete_challenge(&mut self) -> CheckoutResult<&FlowState> {
        if self.state != FlowState::Challenge {
            return Err(CheckoutError::InvalidState {
                message: "no active challenge".to_string(),
            });
        }
        let challenge = self.active_challenge.take().ok_or(CheckoutError::InvalidState {
            message: "no active challenge".to_string(),
        })?;

        match challenge.transaction_reference {
            Some(reference) => {
                self.run_resolution(reference).await;
            }
            None => {
                self.state = FlowState::Form;
            }
        }
        Ok(&self.state)
    }

    /// Returns from `Failed` to the form. Card data was never retained past
    /// submission, so only payer identity fields survive into the next
    /// attempt.
    pub fn retry(&mut self) -> CheckoutResult<&FlowState> {
        if self.state != FlowState::Failed {
            return Err(CheckoutError::InvalidState {
                message: "retry is only available after a failed payment".to_string(),
            });
        }
        self.last_failure = None;
        self.active_reference = None;
        self.state = FlowState::Form;
        Ok(&self.state)
    }

    fn remember_payer_fields(&mut self, form: &PaymentForm) {
        if let Some(session) = self.session.as_mut() {
            session.payer_first_name = form.first_name.clone();
            session.payer_last_name = form.last_name.clone();
            session.phone_country_code = form.country_code.clone();
            session.phone_number = form.phone_number.clone();
            session.narration = form.narration.clone();
            session.currency = form.currency.clone();
        }
    }

    async fn run_resolution(&mut self, reference: String) {
        self.state = FlowState::Pending;
        self.active_reference = Some(reference.clone());

        let resolution = self
            .resolver
            .resolve(&reference, self.cancel_rx.clone())
            .await;

        match resolution {
            Resolution::Success { amount } => {
                self.state = FlowState::Success { amount };
            }
            Resolution::Failed { reason } => {
                self.last_failure = Some(reason);
                self.state = FlowState::Failed;
            }
            Resolution::Cancelled => {
                // View teardown: leave no reference behind so nothing can
                // re-enter the poll loop.
                self.active_reference = None;
            }
        }
    }
}
