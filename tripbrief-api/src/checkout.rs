use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use tripbrief_checkout::CheckoutError;
use tripbrief_core::payment::CheckoutSession;
use tripbrief_core::ClientId;
use tripbrief_shared::CheckoutPlan;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: CheckoutPlan,
    /// Defaults to the id remembered in the client store.
    #[serde(default)]
    pub pending_session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub plan: CheckoutPlan,
    pub pending_session_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/checkout/session", post(create_checkout_session))
}

/// Browser navigation cannot carry the client header, so the redirect takes
/// the pending session id from the query instead.
pub fn redirect_routes() -> Router<AppState> {
    Router::new().route("/v1/checkout/redirect", get(redirect_to_checkout))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/checkout/session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    let pending_session_id = match req.pending_session_id {
        Some(id) => id,
        None => state.checkout.pending_session_id(&client).await?,
    };

    let session = open_checkout(&state, req.plan, pending_session_id).await?;
    Ok(Json(session))
}

/// GET /v1/checkout/redirect?plan=..&pending_session_id=..
/// Responds 303 See Other to the hosted checkout page.
pub async fn redirect_to_checkout(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
) -> Result<Redirect, AppError> {
    let session = open_checkout(&state, query.plan, query.pending_session_id).await?;
    Ok(Redirect::to(&session.url))
}

async fn open_checkout(
    state: &AppState,
    plan: CheckoutPlan,
    pending_session_id: Uuid,
) -> Result<CheckoutSession, CheckoutError> {
    let plan_label = match plan {
        CheckoutPlan::Onetime => "onetime",
        CheckoutPlan::Yearly => "yearly",
    };

    let result = state.checkout.create_checkout_session(plan, pending_session_id).await;
    state
        .metrics
        .checkout(plan_label, if result.is_ok() { "ok" } else { "failed" });
    result
}
