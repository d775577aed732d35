use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::trip::{Destination, TripDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    #[default]
    TravelBrief,
    Itinerary,
    Recommendations,
    Safety,
}

/// Trip payload sent to the completion function and rendered in the
/// brief summary block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripData {
    pub persona: String,
    pub passport_country: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub trip_duration: u32,
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub activity_preferences: Vec<String>,
    pub group_size: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upload_keys: Vec<String>,
    /// Names of fields that were filled with placeholders.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults_applied: Vec<String>,
}

impl TripData {
    /// Snapshot written at session creation. Unset persona or passport
    /// become empty strings; readers treat those as missing.
    pub fn from_draft(draft: &TripDraft) -> Self {
        Self {
            persona: draft.persona.map(|p| p.label().to_string()).unwrap_or_default(),
            passport_country: draft
                .passport_country
                .as_ref()
                .map(|p| p.code.clone())
                .unwrap_or_default(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            trip_duration: draft.trip_duration(),
            destinations: draft.destinations.clone(),
            activity_preferences: draft.activity_preferences.iter().cloned().collect(),
            group_size: draft.group_size.unwrap_or(1),
            ages: draft.ages.clone(),
            budget: draft.budget.map(|b| b.label().to_string()),
            upload_keys: draft.upload_keys.clone(),
            defaults_applied: Vec::new(),
        }
    }
}

/// Named HTML fragments returned by the completion function when it
/// answers in structured form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredBrief {
    pub theme_title: Option<String>,
    pub cover_html: String,
    pub intro_html: String,
    pub day_by_day_html: Option<Vec<String>>,
    pub activities_html: Option<String>,
    pub food_html: Option<String>,
    pub packing_html: Option<String>,
    pub safety_html: Option<String>,
    pub visa_html: Option<String>,
    pub budget_html: Option<String>,
    pub language_html: Option<String>,
    pub persona_tips_html: Option<String>,
    pub weather_html: Option<String>,
    pub transport_html: Option<String>,
    #[serde(alias = "booking_html")]
    pub booking_tips_html: Option<String>,
    pub accessibility_html: Option<String>,
    pub money_html: Option<String>,
    pub final_notes_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BriefContent {
    Structured(StructuredBrief),
    Freeform(String),
}

impl BriefContent {
    pub fn kind(&self) -> &'static str {
        match self {
            BriefContent::Structured(_) => "structured",
            BriefContent::Freeform(_) => "freeform",
        }
    }
}

/// Raw completion output cached next to the assembled HTML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefRecord {
    pub response: String,
    pub prompt: Option<String>,
    pub trip_data: TripData,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefHistoryEntry {
    pub pending_session_id: Uuid,
    pub title: String,
    pub destinations: Vec<String>,
    pub kind: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{Budget, PassportCountry, Persona};

    #[test]
    fn test_trip_data_snapshot_uses_labels() {
        let draft = TripDraft {
            persona: Some(Persona::SoloFemaleTraveler),
            passport_country: Some(PassportCountry { code: "CA".into(), label: "Canada".into() }),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 3),
            destinations: vec![Destination::new("Lisbon", 3)],
            budget: Some(Budget::MidRange),
            ..TripDraft::empty()
        };

        let data = TripData::from_draft(&draft);
        assert_eq!(data.persona, "Solo Female Traveler");
        assert_eq!(data.passport_country, "CA");
        assert_eq!(data.trip_duration, 3);
        assert_eq!(data.group_size, 1);
        assert_eq!(data.budget.as_deref(), Some("Mid-range"));

        let wire = serde_json::to_value(&data).unwrap();
        assert_eq!(wire["passportCountry"], "CA");
        assert!(wire.get("defaultsApplied").is_none());
    }

    #[test]
    fn test_structured_brief_accepts_booking_alias() {
        let brief: StructuredBrief = serde_json::from_str(
            r#"{"cover_html":"<h1>x</h1>","intro_html":"<p>y</p>","booking_html":"<p>b</p>"}"#,
        )
        .unwrap();
        assert_eq!(brief.booking_tips_html.as_deref(), Some("<p>b</p>"));
        assert!(brief.day_by_day_html.is_none());
    }
}
