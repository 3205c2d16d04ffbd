//! Payment status resolution.
//!
//! Drives one transaction reference from `Pending` to a terminal state by
//! polling the gateway's finalize endpoint. The inter-poll delay is a
//! one-shot timer re-armed after each response, never a fixed-period
//! interval: a slow call delays the next poll instead of overlapping it, so
//! at most one finalize call is in flight per reference.

use crate::checkout::client::CheckoutBackend;
use crate::checkout::types::{Money, TransactionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Delay between a `pending` response and the next finalize call.
    pub poll_delay: Duration,
    /// Finalize calls allowed before the attempt is abandoned as timed out.
    pub max_attempts: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_millis(5000),
            max_attempts: 60,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_delay: Duration::from_millis(
                std::env::var("CHECKOUT_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(defaults.poll_delay.as_millis() as u64),
            ),
            max_attempts: std::env::var("CHECKOUT_MAX_POLL_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_attempts),
        }
    }
}

/// Terminal result of one resolution run.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The gateway settled the payment; amount/currency as reported.
    Success { amount: Option<Money> },
    Failed { reason: FailureReason },
    /// The governing view was torn down; the pending timer was cleared and
    /// no further poll fires.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The gateway reported a terminal `failed` status.
    Declined { message: Option<String> },
    /// A finalize call errored; the error kind is preserved in the message
    /// so callers can tell a network blip from a decline after the fact.
    Error { message: String },
    /// The attempt budget ran out while the gateway still reported pending.
    TimedOut { attempts: u32 },
}

pub struct PaymentStatusResolver {
    backend: Arc<dyn CheckoutBackend>,
    config: ResolverConfig,
}

impl PaymentStatusResolver {
    pub fn new(backend: Arc<dyn CheckoutBackend>, config: ResolverConfig) -> Self {
        Self { backend, config }
    }

    /// Polls `reference` until the gateway reports a terminal state, the
    /// attempt budget runs out, or `cancel` fires. Errors are not retried:
    /// they transition straight to `Failed`.
    pub async fn resolve(
        &self,
        reference: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Resolution {
        info!(reference, "payment resolution started");
        let mut attempts: u32 = 0;

        loop {
            if *cancel.borrow() {
                info!(reference, "payment resolution cancelled");
                return Resolution::Cancelled;
            }

            attempts += 1;
            let status = match self.backend.finalize_card_payment(reference).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(reference, attempts, error = %e, "finalize call failed");
                    return Resolution::Failed {
                        reason: FailureReason::Error {
                            message: e.to_string(),
                        },
                    };
                }
            };

            match status.state {
                TransactionState::Success => {
                    info!(reference, attempts, "payment settled");
                    return Resolution::Success {
                        amount: status.amount,
                    };
                }
                TransactionState::Failed => {
                    info!(reference, attempts, "payment failed");
                    return Resolution::Failed {
                        reason: FailureReason::Declined {
                            message: status.failure_reason,
                        },
                    };
                }
                TransactionState::Pending => {
                    if attempts >= self.config.max_attempts {
                        warn!(reference, attempts, "poll budget exhausted");
                        return Resolution::Failed {
                            reason: FailureReason::TimedOut { attempts },
                        };
                    }
                    if wait_for_next_poll(self.config.poll_delay, &mut cancel).await {
                        info!(reference, "payment resolution cancelled");
                        return Resolution::Cancelled;
                    }
                }
            }
        }
    }
}

/// Sleeps out the inter-poll delay, returning `true` if cancellation fired
/// first. A dropped sender counts as cancellation: an orphaned poll after
/// teardown would violate the flow's lifecycle contract.
async fn wait_for_next_poll(delay: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return true,
                Ok(()) => {}
                Err(_) => return true,
            },
            _ = &mut sleep => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::error::{CheckoutError, CheckoutResult};
    use crate::checkout::types::{
        CardSubmission, SessionDetails, SubmitOutcome, TransactionStatus,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedBackend {
        statuses: Mutex<Vec<CheckoutResult<TransactionStatus>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedBackend {
        fn new(statuses: Vec<CheckoutResult<TransactionStatus>>) -> Self {
            Self {
                statuses: Mutex::new(statuses),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CheckoutBackend for ScriptedBackend {
        async fn verify_token(&self, _token: &str) -> CheckoutResult<SessionDetails> {
            unreachable!("resolver never verifies tokens")
        }

        async fn submit_card_details(
            &self,
            _submission: &CardSubmission,
        ) -> CheckoutResult<SubmitOutcome> {
            unreachable!("resolver never submits")
        }

        async fn finalize_card_payment(
            &self,
            _reference: &str,
        ) -> CheckoutResult<TransactionStatus> {
            *self.calls.lock().unwrap() += 1;
            self.statuses.lock().unwrap().remove(0)
        }
    }

    fn status(state: TransactionState) -> CheckoutResult<TransactionStatus> {
        Ok(TransactionStatus {
            state,
            amount: None,
            failure_reason: None,
        })
    }

    #[tokio::test]
    async fn immediate_success_needs_one_call() {
        let backend = Arc::new(ScriptedBackend::new(vec![status(TransactionState::Success)]));
        let resolver = PaymentStatusResolver::new(backend.clone(), ResolverConfig::default());
        let (_tx, rx) = watch::channel(false);
        let resolution = resolver.resolve("ref_1", rx).await;
        assert!(matches!(resolution, Resolution::Success { .. }));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn finalize_error_fails_once_without_retry() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(CheckoutError::Network {
            message: "connection reset".to_string(),
        })]));
        let resolver = PaymentStatusResolver::new(backend.clone(), ResolverConfig::default());
        let (_tx, rx) = watch::channel(false);
        let resolution = resolver.resolve("ref_1", rx).await;
        assert!(matches!(
            resolution,
            Resolution::Failed {
                reason: FailureReason::Error { .. }
            }
        ));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_receiver_polls_nothing() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let resolver = PaymentStatusResolver::new(backend.clone(), ResolverConfig::default());
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let resolution = resolver.resolve("ref_1", rx).await;
        assert_eq!(resolution, Resolution::Cancelled);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn config_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.poll_delay, Duration::from_millis(5000));
        assert_eq!(config.max_attempts, 60);
    }
}
