use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use tripbrief_core::{validate_submission, ClientId};
use tripbrief_shared::models::events::SessionCreatedEvent;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub pending_session_id: Uuid,
    pub brief_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/sessions", post(create_session))
}

/// POST /v1/sessions
/// Validate the stored draft and open a pending session for checkout.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let draft = state.drafts.load(&client).await?;

    let report = validate_submission(&draft, Utc::now().date_naive(), state.rules.max_trip_days);
    if !report.is_ok() {
        return Err(AppError::ValidationError(report.errors));
    }

    let created = state.checkout.create_pending_session(&client, &draft).await?;

    state.metrics.session_created(SessionCreatedEvent {
        pending_session_id: created.id,
        brief_id: created.brief_id,
        persona: draft.persona.map(|p| p.label().to_string()),
        trip_duration: draft.trip_duration(),
        timestamp: Utc::now().timestamp(),
    });

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            pending_session_id: created.id,
            brief_id: created.brief_id,
        }),
    ))
}
