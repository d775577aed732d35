//! Client-store key names. These are the contract between the planning
//! step and the post-payment step, so they must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

pub const TRIP_DRAFT: &str = "tripDraft";
pub const TRIP_DATA: &str = "tripData";
pub const PENDING_SESSION_ID: &str = "pendingSessionId";
pub const LATEST_BRIEF_HTML: &str = "latestBriefHtml";
pub const LATEST_BRIEF_JSON: &str = "latestBriefJson";
pub const BRIEF_HISTORY: &str = "briefHistory";
pub const COOKIE_CONSENT: &str = "cookieConsent";

/// Trip-data snapshot keys in lookup order. Older pages wrote the last two.
pub const TRIP_DATA_KEYS: [&str; 3] = [TRIP_DATA, "trip_data", "travelBriefTripData"];

pub fn subscription(email: &str) -> String {
    format!("subscription:{}", email.trim().to_lowercase())
}

/// Opaque identifier of one browser's client store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > 128 {
            return Err(CoreError::ValidationError("client id must be 1-128 characters".into()));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(CoreError::ValidationError("client id contains invalid characters".into()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
