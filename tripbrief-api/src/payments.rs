use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tripbrief_brief::GenerationOutcome;
use tripbrief_checkout::{CheckoutError, Journey, JourneyState};
use tripbrief_core::ClientId;
use tripbrief_shared::models::events::PaymentVerifiedEvent;
use tripbrief_shared::PromptType;

use crate::briefs::{run_generation, BriefSummary};
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    /// Payment processor session id from the success redirect.
    pub session_id: String,
    #[serde(default)]
    pub pending_session_id: Option<Uuid>,
    #[serde(default)]
    pub prompt_type: Option<PromptType>,
}

/// State of the post-payment page after this request.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub state: JourneyState,
    pub has_paid: bool,
    pub pending_session_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<BriefSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set whenever an error is shown, so the page can offer a contact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/payments/verify", post(verify_payment))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/payments/verify
/// Confirm the payment, then generate the brief once.
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<(StatusCode, Json<VerifyPaymentResponse>), AppError> {
    let pending_session_id = match req.pending_session_id {
        Some(id) => id,
        None => state.checkout.pending_session_id(&client).await?,
    };

    let mut journey = Journey::new();
    let mut page = PageReply::new(&state, pending_session_id);

    let verification = match state
        .checkout
        .verify_payment(&req.session_id, Some(pending_session_id))
        .await
    {
        Ok(verification) => verification,
        Err(CheckoutError::NotConfigured) => return Err(CheckoutError::NotConfigured.into()),
        Err(e) => {
            state.metrics.verification("failed", None);
            let err = AppError::from(e);
            journey.mark_verification_failed(err.message())?;
            journey.display_error(err.message())?;
            return Ok(page.finish(&journey, err.status()));
        }
    };

    let session = verification.session_data.as_ref();
    state.metrics.verification(
        if verification.has_paid { "paid" } else { "unpaid" },
        Some(PaymentVerifiedEvent {
            pending_session_id: Some(pending_session_id),
            has_paid: verification.has_paid,
            mode: session.and_then(|s| s.mode.clone()),
            amount_total: session.and_then(|s| s.amount_total),
            timestamp: Utc::now().timestamp(),
        }),
    );

    if !verification.has_paid {
        let reason = verification
            .reason
            .unwrap_or_else(|| "Payment has not been completed".to_string());
        journey.mark_verification_failed(reason.clone())?;
        journey.display_error(reason)?;
        return Ok(page.finish(&journey, StatusCode::PAYMENT_REQUIRED));
    }

    page.has_paid = true;
    journey.mark_verified()?;
    journey.begin_generation()?;

    match run_generation(&state, &client, pending_session_id, req.prompt_type).await {
        Ok(GenerationOutcome::Generated(brief)) => {
            journey.mark_brief_ready()?;
            page.brief = Some(BriefSummary::from(&brief));
            Ok(page.finish(&journey, StatusCode::OK))
        }
        Ok(GenerationOutcome::AlreadyGenerated) => {
            journey.mark_brief_ready()?;
            Ok(page.finish(&journey, StatusCode::OK))
        }
        // Another request owns the generation; the page polls for the result
        Ok(GenerationOutcome::AlreadyInProgress) => Ok(page.finish(&journey, StatusCode::ACCEPTED)),
        Ok(GenerationOutcome::Aborted) => {
            journey.display_error("Brief generation was cancelled")?;
            Ok(page.finish(&journey, StatusCode::CONFLICT))
        }
        Err(err) => {
            journey.display_error(err.message())?;
            Ok(page.finish(&journey, err.status()))
        }
    }
}

struct PageReply {
    pending_session_id: Uuid,
    has_paid: bool,
    brief: Option<BriefSummary>,
    support_email: String,
}

impl PageReply {
    fn new(state: &AppState, pending_session_id: Uuid) -> Self {
        Self {
            pending_session_id,
            has_paid: false,
            brief: None,
            support_email: state.support_email.clone(),
        }
    }

    fn finish(self, journey: &Journey, status: StatusCode) -> (StatusCode, Json<VerifyPaymentResponse>) {
        let error = journey.error().map(str::to_string);
        let support_email = error.as_ref().map(|_| self.support_email);
        (
            status,
            Json(VerifyPaymentResponse {
                state: journey.state(),
                has_paid: self.has_paid,
                pending_session_id: self.pending_session_id,
                brief: self.brief,
                error,
                support_email,
            }),
        )
    }
}
