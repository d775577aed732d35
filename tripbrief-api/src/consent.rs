use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};

use tripbrief_core::{keys, ClientId};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentChoice {
    Accepted,
    Declined,
}

impl ConsentChoice {
    fn as_str(&self) -> &'static str {
        match self {
            ConsentChoice::Accepted => "accepted",
            ConsentChoice::Declined => "declined",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "accepted" => Some(ConsentChoice::Accepted),
            "declined" => Some(ConsentChoice::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsentBody {
    /// `None` until the banner has been answered.
    pub consent: Option<ConsentChoice>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/consent", get(get_consent).put(set_consent))
}

/// GET /v1/consent
pub async fn get_consent(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
) -> Result<Json<ConsentBody>, AppError> {
    let consent = state
        .store
        .get(&client, keys::COOKIE_CONSENT)
        .await?
        .and_then(|raw| ConsentChoice::parse(&raw));
    Ok(Json(ConsentBody { consent }))
}

/// PUT /v1/consent
pub async fn set_consent(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    Json(body): Json<ConsentBody>,
) -> Result<Json<ConsentBody>, AppError> {
    let choice = body
        .consent
        .ok_or_else(|| AppError::validation("consent must be \"accepted\" or \"declined\""))?;
    state.store.set(&client, keys::COOKIE_CONSENT, choice.as_str()).await?;
    Ok(Json(ConsentBody { consent: Some(choice) }))
}
