use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use tripbrief_core::draft::DraftView;
use tripbrief_core::{validate_local, validate_submission, ClientId, ValidationReport};
use tripbrief_shared::TripDraftPatch;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DraftValidationResponse {
    pub is_valid: bool,
    /// Step-navigation checks.
    pub local: ValidationReport,
    /// Checks applied before a pending session is created.
    pub submission: ValidationReport,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/draft", get(get_draft).patch(update_draft).delete(clear_draft))
        .route("/v1/draft/validate", post(validate_draft))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/draft
pub async fn get_draft(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Json<DraftView>, AppError> {
    let draft = state.drafts.load(&client).await?;
    Ok(Json(DraftView::from(draft)))
}

/// PATCH /v1/draft
pub async fn update_draft(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(patch): Json<TripDraftPatch>,
) -> Result<Json<DraftView>, AppError> {
    let draft = state.drafts.update(&client, patch).await?;
    Ok(Json(DraftView::from(draft)))
}

/// DELETE /v1/draft
pub async fn clear_draft(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<StatusCode, AppError> {
    state.drafts.clear(&client).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/draft/validate
pub async fn validate_draft(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Json<DraftValidationResponse>, AppError> {
    let draft = state.drafts.load(&client).await?;
    let today = Utc::now().date_naive();

    Ok(Json(DraftValidationResponse {
        is_valid: draft.is_valid(),
        local: validate_local(&draft),
        submission: validate_submission(&draft, today, state.rules.max_trip_days),
    }))
}
