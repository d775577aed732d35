use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};

use tripbrief_checkout::SubscriptionStatus;
use tripbrief_core::ClientId;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckSubscriptionRequest {
    pub email: String,
    /// Skip the cached flag and ask the backend.
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct CancelSubscriptionRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CancelSubscriptionResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/subscriptions/check", post(check_subscription))
        .route("/v1/subscriptions/cancel", post(cancel_subscription))
}

/// POST /v1/subscriptions/check
pub async fn check_subscription(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(req): Json<CheckSubscriptionRequest>,
) -> Result<Json<SubscriptionStatus>, AppError> {
    let status = state.subscriptions.check(&client, &req.email, req.refresh).await?;
    Ok(Json(status))
}

/// POST /v1/subscriptions/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(req): Json<CancelSubscriptionRequest>,
) -> Result<Json<CancelSubscriptionResponse>, AppError> {
    let outcome = state.subscriptions.cancel(&client, &req.email).await?;
    Ok(Json(CancelSubscriptionResponse { success: outcome.success }))
}
