use async_trait::async_trait;
use uuid::Uuid;

use tripbrief_core::payment::{CancelOutcome, CheckoutSession, PaymentGateway, SessionData, SessionVerification};
use tripbrief_core::CoreResult;
use tripbrief_shared::CheckoutPlan;

const MOCK_SESSION_PREFIX: &str = "mock_cs_";

/// Local development gateway. Checkout points at a configurable page and
/// every verification reports a paid session.
pub struct MockPaymentGateway {
    checkout_url: String,
}

impl MockPaymentGateway {
    pub fn new(checkout_url: impl Into<String>) -> Self {
        Self {
            checkout_url: checkout_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        plan: CheckoutPlan,
        pending_session_id: Uuid,
    ) -> CoreResult<CheckoutSession> {
        // The plan rides in the session id so verification can report it
        let plan = match plan {
            CheckoutPlan::Onetime => "onetime",
            CheckoutPlan::Yearly => "yearly",
        };
        Ok(CheckoutSession {
            url: format!(
                "{}?session_id={}{}_{}",
                self.checkout_url,
                MOCK_SESSION_PREFIX,
                plan,
                pending_session_id.simple()
            ),
        })
    }

    async fn verify_session(
        &self,
        payment_session_id: &str,
        _pending_session_id: Option<Uuid>,
    ) -> CoreResult<SessionVerification> {
        let mode = if payment_session_id.contains("yearly") { "subscription" } else { "payment" };
        Ok(SessionVerification {
            has_paid: true,
            reason: None,
            session_data: Some(SessionData {
                payment_status: "paid".to_string(),
                customer_email: Some("traveler@example.com".to_string().into()),
                mode: Some(mode.to_string()),
                amount_total: Some(1900),
            }),
        })
    }

    async fn check_subscription(&self, _email: &str) -> CoreResult<bool> {
        Ok(false)
    }

    async fn cancel_subscription(&self, _email: &str) -> CoreResult<CancelOutcome> {
        Ok(CancelOutcome { success: true, error: None })
    }
}
