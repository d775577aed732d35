use std::sync::Arc;

use serde::Serialize;
use tripbrief_shared::{TripDraft, TripDraftPatch};

use crate::keys::{self, ClientId};
use crate::repository::{get_json, set_json, ClientStore};
use crate::CoreResult;

/// Draft plus the values derived from it on every read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub draft: TripDraft,
    pub trip_duration: u32,
    pub allocated_days: u32,
    pub is_valid: bool,
}

impl From<TripDraft> for DraftView {
    fn from(draft: TripDraft) -> Self {
        Self {
            trip_duration: draft.trip_duration(),
            allocated_days: draft.allocated_days(),
            is_valid: draft.is_valid(),
            draft,
        }
    }
}

/// Holds each client's in-progress trip form.
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn ClientStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, client: &ClientId) -> CoreResult<TripDraft> {
        Ok(get_json(self.store.as_ref(), client, keys::TRIP_DRAFT)
            .await?
            .unwrap_or_else(TripDraft::empty))
    }

    /// Merge `patch` into the stored draft and persist it. File blobs ride
    /// along in the returned value but are never written.
    pub async fn update(&self, client: &ClientId, patch: TripDraftPatch) -> CoreResult<TripDraft> {
        let mut draft = self.load(client).await?;
        patch.apply(&mut draft);
        set_json(self.store.as_ref(), client, keys::TRIP_DRAFT, &draft).await?;
        tracing::debug!(
            "Draft updated for {}: {} destinations, {} days",
            client,
            draft.destinations.len(),
            draft.trip_duration()
        );
        Ok(draft)
    }

    pub async fn clear(&self, client: &ClientId) -> CoreResult<()> {
        self.store.remove(client, keys::TRIP_DRAFT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tripbrief_shared::{Destination, Persona, Upload};

    #[derive(Default)]
    struct MapStore {
        values: Mutex<HashMap<(String, String), String>>,
    }

    #[async_trait]
    impl ClientStore for MapStore {
        async fn get(&self, client: &ClientId, key: &str) -> CoreResult<Option<String>> {
            Ok(self.values.lock().unwrap().get(&(client.to_string(), key.to_string())).cloned())
        }

        async fn set(&self, client: &ClientId, key: &str, value: &str) -> CoreResult<()> {
            self.values
                .lock()
                .unwrap()
                .insert((client.to_string(), key.to_string()), value.to_string());
            Ok(())
        }

        async fn remove(&self, client: &ClientId, key: &str) -> CoreResult<()> {
            self.values.lock().unwrap().remove(&(client.to_string(), key.to_string()));
            Ok(())
        }
    }

    fn setup() -> (Arc<MapStore>, DraftStore, ClientId) {
        let map = Arc::new(MapStore::default());
        let drafts = DraftStore::new(map.clone());
        (map, drafts, ClientId::parse("client-1").unwrap())
    }

    #[tokio::test]
    async fn test_update_persists_and_merges() {
        let (map, drafts, client) = setup();

        drafts
            .update(&client, TripDraftPatch { persona: Some(Persona::Minor), ..Default::default() })
            .await
            .unwrap();
        drafts
            .update(
                &client,
                TripDraftPatch {
                    start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                    end_date: NaiveDate::from_ymd_opt(2025, 6, 7),
                    destinations: Some(vec![Destination::new("Paris", 4), Destination::new("Lyon", 3)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let view = DraftView::from(drafts.load(&client).await.unwrap());
        assert_eq!(view.draft.persona, Some(Persona::Minor));
        assert_eq!(view.trip_duration, 7);
        assert_eq!(view.allocated_days, 7);
        assert!(!view.is_valid);
        assert!(map.get(&client, keys::TRIP_DRAFT).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_uploads_are_not_persisted() {
        let (map, drafts, client) = setup();
        let returned = drafts
            .update(
                &client,
                TripDraftPatch {
                    uploads: Some(vec![Upload {
                        file_name: "visa.png".into(),
                        content_type: "image/png".into(),
                        bytes: vec![0; 16],
                    }]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(returned.uploads.len(), 1);

        let raw = map.get(&client, keys::TRIP_DRAFT).await.unwrap().unwrap();
        assert!(!raw.contains("visa.png"));
        assert!(drafts.load(&client).await.unwrap().uploads.is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_to_empty() {
        let (map, drafts, client) = setup();
        drafts
            .update(
                &client,
                TripDraftPatch {
                    destinations: Some(vec![Destination::new("Oslo", 2)]),
                    activity_preferences: Some(["hiking".to_string()].into_iter().collect()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        drafts.clear(&client).await.unwrap();

        assert!(map.get(&client, keys::TRIP_DRAFT).await.unwrap().is_none());
        let draft = drafts.load(&client).await.unwrap();
        assert!(draft.destinations.is_empty());
        assert!(draft.activity_preferences.is_empty());
        assert_eq!(draft, TripDraft::empty());
    }

    #[tokio::test]
    async fn test_clients_are_isolated() {
        let (_, drafts, client) = setup();
        let other = ClientId::parse("client-2").unwrap();
        drafts
            .update(&client, TripDraftPatch { ages: Some("4, 9".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(drafts.load(&other).await.unwrap().ages.is_none());
    }
}
