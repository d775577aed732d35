use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use tripbrief_core::keys;
use tripbrief_core::payment::{CancelOutcome, PaymentGateway};
use tripbrief_core::repository::ClientStore;
use tripbrief_core::{ClientId, CoreError};

use crate::orchestrator::CheckoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
    /// Answered from the client store without calling the backend.
    pub cached: bool,
}

/// Yearly-plan subscription lookups, cached per email in the client store.
pub struct SubscriptionService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn ClientStore>,
}

impl SubscriptionService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn ClientStore>) -> Self {
        Self { gateway, store }
    }

    pub async fn check(
        &self,
        client: &ClientId,
        email: &str,
        refresh: bool,
    ) -> Result<SubscriptionStatus, CheckoutError> {
        let email = normalize_email(email)?;
        let key = keys::subscription(&email);

        if !refresh {
            if let Some(flag) = self.store.get(client, &key).await? {
                return Ok(SubscriptionStatus {
                    is_subscribed: flag == "true",
                    cached: true,
                });
            }
        }

        let is_subscribed = match self.gateway.check_subscription(&email).await {
            Ok(flag) => flag,
            Err(CoreError::NotConfigured) => {
                warn!("Subscription check skipped: backend platform is not configured");
                return Ok(SubscriptionStatus { is_subscribed: false, cached: false });
            }
            Err(e) => {
                error!("Subscription check failed: {}", e);
                return Err(CheckoutError::SubscriptionFailed("Failed to check subscription".into()));
            }
        };

        self.store.set(client, &key, if is_subscribed { "true" } else { "false" }).await?;
        Ok(SubscriptionStatus { is_subscribed, cached: false })
    }

    pub async fn cancel(&self, client: &ClientId, email: &str) -> Result<CancelOutcome, CheckoutError> {
        let email = normalize_email(email)?;

        let outcome = self.gateway.cancel_subscription(&email).await.map_err(|e| match e {
            CoreError::NotConfigured => CheckoutError::NotConfigured,
            other => {
                error!("Subscription cancel failed: {}", other);
                CheckoutError::SubscriptionFailed(
                    other
                        .upstream_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| "Failed to cancel subscription".into()),
                )
            }
        })?;

        if !outcome.success {
            return Err(CheckoutError::SubscriptionFailed(
                outcome.error.unwrap_or_else(|| "Failed to cancel subscription".into()),
            ));
        }

        self.store.set(client, &keys::subscription(&email), "false").await?;
        info!("Subscription cancelled for client {}", client);
        Ok(outcome)
    }
}

fn normalize_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(CoreError::ValidationError("Please enter a valid email address.".into())),
    }
}
