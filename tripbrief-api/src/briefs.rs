use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tripbrief_brief::render::brief_title;
use tripbrief_brief::{export, history, GeneratedBrief, GenerationOutcome};
use tripbrief_checkout::CheckoutError;
use tripbrief_core::ClientId;
use tripbrief_shared::models::events::BriefGeneratedEvent;
use tripbrief_shared::{BriefHistoryEntry, BriefRecord, PromptType};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateBriefRequest {
    #[serde(default)]
    pub pending_session_id: Option<Uuid>,
    #[serde(default)]
    pub prompt_type: Option<PromptType>,
}

#[derive(Debug, Serialize)]
pub struct BriefSummary {
    pub pending_session_id: Uuid,
    pub title: String,
    /// "structured" or "freeform"
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    pub defaults_applied: Vec<String>,
}

impl From<&GeneratedBrief> for BriefSummary {
    fn from(brief: &GeneratedBrief) -> Self {
        Self {
            pending_session_id: brief.pending_session_id,
            title: brief_title(&brief.trip_data, &brief.content),
            kind: brief.content.kind().to_string(),
            generated_at: brief.generated_at,
            defaults_applied: brief.trip_data.defaults_applied.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateBriefResponse {
    /// `generated` or `already_generated`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<BriefSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LatestBriefResponse {
    pub record: Option<BriefRecord>,
    /// Empty when no brief has been generated.
    pub html: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/briefs", post(generate_brief))
        .route("/v1/briefs/latest", get(latest_brief))
        .route("/v1/briefs/history", get(brief_history))
        .route("/v1/briefs/latest/print", get(print_brief))
        .route("/v1/briefs/latest/text", get(text_brief))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/briefs
/// Generate (or re-try generating) the brief for a paid pending session.
pub async fn generate_brief(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(req): Json<GenerateBriefRequest>,
) -> Result<(StatusCode, Json<GenerateBriefResponse>), AppError> {
    let pending_session_id = match req.pending_session_id {
        Some(id) => id,
        None => state.checkout.pending_session_id(&client).await?,
    };

    // Only a paid session row may reach the AI call
    match state.sessions.lookup(pending_session_id).await? {
        Some(session) if session.has_paid => {}
        Some(_) => {
            return Err(AppError::PaymentRequired(
                "Payment is required before a brief can be generated".to_string(),
            ));
        }
        None => {
            tracing::warn!("Brief requested for unknown pending session {}", pending_session_id);
            return Err(CheckoutError::NoPendingSession.into());
        }
    }

    let outcome = run_generation(&state, &client, pending_session_id, req.prompt_type).await?;
    match outcome {
        GenerationOutcome::Generated(brief) => Ok((
            StatusCode::CREATED,
            Json(GenerateBriefResponse {
                status: "generated",
                brief: Some(BriefSummary::from(&brief)),
                html: Some(brief.html),
            }),
        )),
        GenerationOutcome::AlreadyGenerated => Ok((
            StatusCode::OK,
            Json(GenerateBriefResponse {
                status: "already_generated",
                brief: None,
                html: None,
            }),
        )),
        GenerationOutcome::AlreadyInProgress => Err(AppError::ConflictError(
            "Brief generation is already in progress".to_string(),
        )),
        GenerationOutcome::Aborted => Err(AppError::ConflictError(
            "Brief generation was cancelled".to_string(),
        )),
    }
}

/// Run one generation and record its metrics. A dropped request future
/// releases the generation guard on its own.
pub(crate) async fn run_generation(
    state: &AppState,
    client: &ClientId,
    pending_session_id: Uuid,
    prompt_type: Option<PromptType>,
) -> Result<GenerationOutcome, AppError> {
    let result = state
        .briefs
        .generate(client, pending_session_id, prompt_type, std::future::pending::<()>())
        .await;

    match &result {
        Ok(GenerationOutcome::Generated(brief)) => state.metrics.brief_generated(BriefGeneratedEvent {
            pending_session_id,
            kind: brief.content.kind().to_string(),
            defaults_applied: brief.trip_data.defaults_applied.len(),
            timestamp: brief.generated_at.timestamp(),
        }),
        Ok(GenerationOutcome::AlreadyGenerated) => state.metrics.brief_outcome("already_generated"),
        Ok(GenerationOutcome::AlreadyInProgress) => state.metrics.brief_outcome("in_progress"),
        Ok(GenerationOutcome::Aborted) => state.metrics.brief_outcome("aborted"),
        Err(_) => state.metrics.brief_outcome("failed"),
    }

    result.map_err(AppError::from)
}

/// GET /v1/briefs/latest
pub async fn latest_brief(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Json<LatestBriefResponse>, AppError> {
    let store = state.store.as_ref();
    Ok(Json(LatestBriefResponse {
        record: history::load_latest_record(store, &client).await?,
        html: history::load_latest_html(store, &client).await?,
    }))
}

/// GET /v1/briefs/history
pub async fn brief_history(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Json<Vec<BriefHistoryEntry>>, AppError> {
    Ok(Json(history::load_history(state.store.as_ref(), &client).await?))
}

/// GET /v1/briefs/latest/print
/// Print-ready HTML; the browser's print dialog saves it as PDF.
pub async fn print_brief(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Html<String>, AppError> {
    let html = history::load_latest_html(state.store.as_ref(), &client).await?;
    Ok(Html(export::print_document(&html)))
}

/// GET /v1/briefs/latest/text
pub async fn text_brief(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Response, AppError> {
    let html = history::load_latest_html(state.store.as_ref(), &client).await?;
    let disposition = format!("attachment; filename=\"{}\"", export::TEXT_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export::plain_text(&html),
    )
        .into_response())
}
