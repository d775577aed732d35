use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use tripbrief_core::keys;
use tripbrief_core::payment::{CheckoutSession, PaymentGateway, SessionVerification};
use tripbrief_core::repository::{set_json, ClientStore, PendingSessionRepository};
use tripbrief_core::validation::duration_limit_message;
use tripbrief_core::{ClientId, CoreError, MAX_TRIP_DAYS};
use tripbrief_shared::{CheckoutPlan, PendingSession, TripData, TripDraft};

pub const CHECKOUT_FAILED: &str = "Checkout failed. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("{0}")]
    DurationExceeded(String),

    #[error("Failed to create session")]
    SessionCreation,

    #[error("{0}")]
    CheckoutFailed(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    #[error("No pending session found. Please start planning again.")]
    NoPendingSession,

    #[error("{0}")]
    SubscriptionFailed(String),

    #[error("Backend platform is not configured")]
    NotConfigured,

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Identifiers of a freshly inserted pending session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedSession {
    pub id: Uuid,
    pub brief_id: Uuid,
}

/// Drives a trip from a validated draft to a paid pending session.
pub struct CheckoutOrchestrator {
    sessions: Arc<dyn PendingSessionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn ClientStore>,
    max_trip_days: u32,
}

impl CheckoutOrchestrator {
    pub fn new(
        sessions: Arc<dyn PendingSessionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn ClientStore>,
    ) -> Self {
        Self {
            sessions,
            gateway,
            store,
            max_trip_days: MAX_TRIP_DAYS,
        }
    }

    pub fn with_max_trip_days(mut self, max_trip_days: u32) -> Self {
        self.max_trip_days = max_trip_days;
        self
    }

    /// Insert a pending session for the draft and remember its id in the
    /// client store so it survives the payment redirect.
    ///
    /// The duration ceiling is checked again here, before anything is
    /// sent to the backend.
    pub async fn create_pending_session(
        &self,
        client: &ClientId,
        draft: &TripDraft,
    ) -> Result<CreatedSession, CheckoutError> {
        if draft.trip_duration() > self.max_trip_days {
            return Err(CheckoutError::DurationExceeded(duration_limit_message(
                draft.persona,
                self.max_trip_days,
            )));
        }

        let session = PendingSession::from_draft(Uuid::new_v4(), Uuid::new_v4(), draft);
        let id = self.sessions.insert(&session).await.map_err(|e| match e {
            CoreError::NotConfigured => CheckoutError::NotConfigured,
            other => {
                error!("Pending session insert failed: {}", other);
                CheckoutError::SessionCreation
            }
        })?;

        self.store.set(client, keys::PENDING_SESSION_ID, &id.to_string()).await?;
        set_json(self.store.as_ref(), client, keys::TRIP_DATA, &TripData::from_draft(draft)).await?;

        info!("Pending session {} created for client {}", id, client);
        Ok(CreatedSession {
            id,
            brief_id: session.brief_id,
        })
    }

    /// Pending session id stored by the last successful creation.
    pub async fn pending_session_id(&self, client: &ClientId) -> Result<Uuid, CheckoutError> {
        let raw = self
            .store
            .get(client, keys::PENDING_SESSION_ID)
            .await?
            .ok_or(CheckoutError::NoPendingSession)?;

        Uuid::parse_str(raw.trim()).map_err(|_| {
            warn!("Unreadable pending session id for client {}", client);
            CheckoutError::NoPendingSession
        })
    }

    pub async fn create_checkout_session(
        &self,
        plan: CheckoutPlan,
        pending_session_id: Uuid,
    ) -> Result<CheckoutSession, CheckoutError> {
        let session = self
            .gateway
            .create_checkout_session(plan, pending_session_id)
            .await
            .map_err(|e| match e {
                CoreError::NotConfigured => CheckoutError::NotConfigured,
                other => {
                    error!("Checkout session for {} failed: {}", pending_session_id, other);
                    CheckoutError::CheckoutFailed(
                        other
                            .upstream_message()
                            .map(str::to_string)
                            .unwrap_or_else(|| CHECKOUT_FAILED.to_string()),
                    )
                }
            })?;

        if session.url.trim().is_empty() {
            error!("Checkout session for {} returned no url", pending_session_id);
            return Err(CheckoutError::CheckoutFailed(CHECKOUT_FAILED.to_string()));
        }

        info!("Checkout session opened for {} ({:?})", pending_session_id, plan);
        Ok(session)
    }

    /// Ask the payment processor whether the session was paid. A paid
    /// result is written back onto the pending session row.
    pub async fn verify_payment(
        &self,
        payment_session_id: &str,
        pending_session_id: Option<Uuid>,
    ) -> Result<SessionVerification, CheckoutError> {
        if payment_session_id.trim().is_empty() {
            return Err(CheckoutError::VerificationFailed("missing payment session id".into()));
        }

        let verification = self
            .gateway
            .verify_session(payment_session_id, pending_session_id)
            .await
            .map_err(|e| match e {
                CoreError::NotConfigured => CheckoutError::NotConfigured,
                other => {
                    error!("Verification of {} failed: {}", payment_session_id, other);
                    let reason = match other.upstream_message() {
                        Some(message) => message.to_string(),
                        None => "payment service unavailable".to_string(),
                    };
                    CheckoutError::VerificationFailed(reason)
                }
            })?;

        if !verification.has_paid {
            info!(
                "Payment session {} not paid: {}",
                payment_session_id,
                verification.reason.as_deref().unwrap_or("no reason given")
            );
            return Ok(verification);
        }

        if let Some(id) = pending_session_id {
            let data = verification.session_data.as_ref();
            let email = data.and_then(|d| d.customer_email.as_ref()).map(|e| e.expose().as_str());
            let plan = data
                .and_then(|d| d.mode.as_deref())
                .map(CheckoutPlan::from_mode)
                .unwrap_or(CheckoutPlan::Onetime)
                .plan_type();

            // A failed write-back does not fail the verification.
            if let Err(e) = self.sessions.record_payment(id, email, plan, Utc::now()).await {
                error!("Recording payment on pending session {} failed: {}", id, e);
            }
        }

        Ok(verification)
    }
}
