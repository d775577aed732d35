use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tripbrief_shared::pii::Masked;
use tripbrief_shared::CheckoutPlan;

use crate::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutSession {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub payment_status: String,
    pub customer_email: Option<Masked<String>>,
    pub mode: Option<String>,
    pub amount_total: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionVerification {
    pub has_paid: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub session_data: Option<SessionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Hosted checkout and the serverless functions around it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Obtain the redirect URL of a hosted checkout page.
    async fn create_checkout_session(
        &self,
        plan: CheckoutPlan,
        pending_session_id: Uuid,
    ) -> CoreResult<CheckoutSession>;

    /// Confirm paid status after the redirect back.
    async fn verify_session(
        &self,
        payment_session_id: &str,
        pending_session_id: Option<Uuid>,
    ) -> CoreResult<SessionVerification>;

    async fn check_subscription(&self, email: &str) -> CoreResult<bool>;

    async fn cancel_subscription(&self, email: &str) -> CoreResult<CancelOutcome>;
}
