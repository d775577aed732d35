//! Assembles the trip payload for brief generation.
//!
//! The snapshot is read from the client store first, under the current key
//! and the two legacy ones. Older pages wrote it in several shapes, so
//! parsing is tolerant. When the snapshot is missing or incomplete the
//! pending session row is fetched from the backend instead.

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use tripbrief_core::keys::{self, ClientId};
use tripbrief_core::repository::{ClientStore, PendingSessionRepository};
use tripbrief_core::CoreError;
use tripbrief_shared::{Destination, PendingSession, TripData};

use crate::generator::BriefError;

pub const DEFAULT_PERSONA: &str = "Experienced";
pub const DEFAULT_PASSPORT: &str = "US";
pub const DEFAULT_CITY: &str = "Tokyo";
pub const DEFAULT_CITY_DAYS: u32 = 7;

/// Trip fields as found, before defaults.
#[derive(Debug, Clone, Default, PartialEq)]
struct PartialTrip {
    persona: Option<String>,
    passport_country: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    destinations: Vec<Destination>,
    activity_preferences: Vec<String>,
    group_size: Option<u8>,
    ages: Option<String>,
    budget: Option<String>,
    upload_keys: Vec<String>,
}

impl PartialTrip {
    fn is_complete(&self) -> bool {
        self.persona.is_some() && !self.destinations.is_empty() && self.start_date.is_some()
    }

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |names: &[&str]| names.iter().find_map(|n| obj.get(*n)).filter(|v| !v.is_null());

        let persona = field(&["persona"]).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            other => text(other, &["label", "value"]),
        });
        let passport_country = field(&["passportCountry", "passport_country"]).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            other => text(other, &["code", "value", "label"]),
        });
        let destinations = field(&["destinations"])
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(destination).collect())
            .unwrap_or_default();
        let group_size = field(&["groupSize", "group_size"]).and_then(|v| match v {
            Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Some(Self {
            persona: persona.and_then(non_empty),
            passport_country: passport_country.and_then(non_empty),
            start_date: field(&["startDate", "start_date"]).and_then(date),
            end_date: field(&["endDate", "end_date"]).and_then(date),
            destinations,
            activity_preferences: strings(field(&["activityPreferences", "activity_preferences"])),
            group_size,
            ages: field(&["ages"]).and_then(Value::as_str).map(str::to_string).and_then(non_empty),
            budget: field(&["budget"]).and_then(Value::as_str).map(str::to_string).and_then(non_empty),
            upload_keys: strings(field(&["uploadKeys", "upload_keys"])),
        })
    }

    fn from_session(row: &PendingSession) -> Self {
        Self {
            persona: row.persona.map(|p| p.label().to_string()),
            passport_country: row.passport_country.as_ref().map(|p| p.code.clone()),
            start_date: row.start_date,
            end_date: row.end_date,
            destinations: row.destinations.clone(),
            activity_preferences: row.activity_preferences.clone(),
            group_size: row.group_size,
            ages: row.ages.clone(),
            budget: row.budget.map(|b| b.label().to_string()),
            upload_keys: row.upload_keys.clone(),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_str)).map(str::to_string)
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Accepts `2025-06-01` as well as full timestamps.
fn date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?;
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn destination(value: &Value) -> Option<Destination> {
    let city_name = ["cityName", "city_name", "city", "name"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))?
        .trim()
        .to_string();
    if city_name.is_empty() {
        return None;
    }
    let days_allocated = ["daysAllocated", "days_allocated", "days"]
        .iter()
        .find_map(|k| value.get(*k))
        .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);

    Some(Destination {
        city_name,
        country: value.get("country").and_then(Value::as_str).map(str::to_string),
        days_allocated,
    })
}

pub struct TripDataResolver {
    store: Arc<dyn ClientStore>,
    sessions: Arc<dyn PendingSessionRepository>,
    allow_defaults: bool,
}

impl TripDataResolver {
    pub fn new(store: Arc<dyn ClientStore>, sessions: Arc<dyn PendingSessionRepository>, allow_defaults: bool) -> Self {
        Self {
            store,
            sessions,
            allow_defaults,
        }
    }

    pub async fn resolve(&self, client: &ClientId, pending_session_id: Uuid) -> Result<TripData, BriefError> {
        let mut trip = self.from_client_store(client).await?;

        if !trip.as_ref().is_some_and(PartialTrip::is_complete) {
            debug!("Trip snapshot incomplete for {}; looking up pending session", pending_session_id);
            match self.sessions.lookup(pending_session_id).await {
                Ok(Some(row)) => trip = Some(PartialTrip::from_session(&row)),
                Ok(None) => warn!("Pending session {} not found during lookup", pending_session_id),
                Err(CoreError::NotConfigured) => warn!("Pending session lookup skipped: backend platform is not configured"),
                Err(e) => warn!("Pending session lookup for {} failed: {}", pending_session_id, e),
            }
        }

        self.finish(trip.unwrap_or_default())
    }

    async fn from_client_store(&self, client: &ClientId) -> Result<Option<PartialTrip>, BriefError> {
        for key in keys::TRIP_DATA_KEYS {
            let Some(raw) = self.store.get(client, key).await? else {
                continue;
            };
            match serde_json::from_str::<Value>(&raw).ok().as_ref().and_then(PartialTrip::from_value) {
                Some(trip) => return Ok(Some(trip)),
                None => warn!("Ignoring unreadable trip snapshot under {}", key),
            }
        }
        Ok(None)
    }

    fn finish(&self, trip: PartialTrip) -> Result<TripData, BriefError> {
        let mut missing = Vec::new();
        if trip.persona.is_none() {
            missing.push("persona");
        }
        if trip.destinations.is_empty() {
            missing.push("destinations");
        }
        if trip.passport_country.is_none() {
            missing.push("passportCountry");
        }
        if trip.group_size.is_none() {
            missing.push("groupSize");
        }

        if !missing.is_empty() && !self.allow_defaults {
            return Err(BriefError::TripDataUnavailable(missing.join(", ")));
        }
        for field in &missing {
            warn!("Trip data has no {}; using placeholder", field);
        }

        let destinations = if trip.destinations.is_empty() {
            vec![Destination::new(DEFAULT_CITY, DEFAULT_CITY_DAYS)]
        } else {
            trip.destinations
        };
        let trip_duration = match (trip.start_date, trip.end_date) {
            (Some(start), Some(end)) => u32::try_from((end - start).num_days() + 1).unwrap_or(0),
            _ => destinations.iter().map(|d| d.days_allocated).sum(),
        };

        Ok(TripData {
            persona: trip.persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            passport_country: trip.passport_country.unwrap_or_else(|| DEFAULT_PASSPORT.to_string()),
            start_date: trip.start_date,
            end_date: trip.end_date,
            trip_duration,
            destinations,
            activity_preferences: trip.activity_preferences,
            group_size: trip.group_size.unwrap_or(1),
            ages: trip.ages,
            budget: trip.budget,
            upload_keys: trip.upload_keys,
            defaults_applied: missing.into_iter().map(str::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tripbrief_shared::{Persona, TripDraft};
    use tripbrief_store::{MemoryClientStore, MemorySessionRepository};

    fn resolver(allow_defaults: bool) -> (TripDataResolver, Arc<MemoryClientStore>, Arc<MemorySessionRepository>) {
        let store = Arc::new(MemoryClientStore::new());
        let repo = Arc::new(MemorySessionRepository::new());
        (TripDataResolver::new(store.clone(), repo.clone(), allow_defaults), store, repo)
    }

    fn client() -> ClientId {
        ClientId::parse("c1").unwrap()
    }

    #[test]
    fn test_tolerant_parse_of_legacy_shape() {
        let value = json!({
            "persona": "Family",
            "passport_country": { "code": "FR", "label": "France" },
            "start_date": "2025-06-01T00:00:00.000Z",
            "endDate": "2025-06-03",
            "destinations": [{ "city": "Nice", "days": "3" }, { "cityName": "" }],
            "groupSize": "4",
        });

        let trip = PartialTrip::from_value(&value).unwrap();
        assert_eq!(trip.persona.as_deref(), Some("Family"));
        assert_eq!(trip.passport_country.as_deref(), Some("FR"));
        assert_eq!(trip.start_date, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(trip.destinations, vec![Destination::new("Nice", 3)]);
        assert_eq!(trip.group_size, Some(4));
        assert!(trip.is_complete());
    }

    #[tokio::test]
    async fn test_first_key_wins() {
        let (resolver, store, _) = resolver(true);
        let c = client();
        store
            .set(&c, "trip_data", &json!({ "persona": "Minor", "destinations": [{"cityName": "Rome", "daysAllocated": 2}], "startDate": "2025-01-01" }).to_string())
            .await
            .unwrap();
        store
            .set(&c, "travelBriefTripData", &json!({ "persona": "Family" }).to_string())
            .await
            .unwrap();

        let trip = resolver.resolve(&c, Uuid::new_v4()).await.unwrap();
        assert_eq!(trip.persona, "Minor");
        assert_eq!(trip.trip_duration, 2);
        assert_eq!(trip.defaults_applied, vec!["passportCountry", "groupSize"]);
    }

    #[tokio::test]
    async fn test_incomplete_snapshot_falls_back_to_session_row() {
        let (resolver, store, repo) = resolver(true);
        let c = client();
        store.set(&c, keys::TRIP_DATA, r#"{"persona":"Family"}"#).await.unwrap();

        let draft = TripDraft {
            persona: Some(Persona::SoloFemaleTraveler),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 7),
            destinations: vec![Destination::new("Paris", 4), Destination::new("Lyon", 3)],
            group_size: Some(1),
            ..TripDraft::empty()
        };
        let row = PendingSession::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft);
        repo.insert(&row).await.unwrap();

        let trip = resolver.resolve(&c, row.id).await.unwrap();
        assert_eq!(trip.persona, "Solo Female Traveler");
        assert_eq!(trip.trip_duration, 7);
        assert_eq!(trip.passport_country, DEFAULT_PASSPORT);
        assert_eq!(trip.defaults_applied, vec!["passportCountry"]);
    }

    #[tokio::test]
    async fn test_placeholders_when_nothing_found() {
        let (resolver, _, _) = resolver(true);
        let trip = resolver.resolve(&client(), Uuid::new_v4()).await.unwrap();

        assert_eq!(trip.persona, DEFAULT_PERSONA);
        assert_eq!(trip.destinations, vec![Destination::new("Tokyo", 7)]);
        assert_eq!(trip.group_size, 1);
        assert_eq!(trip.trip_duration, 7);
        assert_eq!(trip.defaults_applied.len(), 4);
    }

    #[tokio::test]
    async fn test_placeholders_can_be_disabled() {
        let (resolver, _, _) = resolver(false);
        let err = resolver.resolve(&client(), Uuid::new_v4()).await.unwrap_err();
        match err {
            BriefError::TripDataUnavailable(fields) => assert!(fields.contains("persona")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
