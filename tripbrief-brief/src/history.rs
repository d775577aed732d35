use tripbrief_core::keys::{self, ClientId};
use tripbrief_core::repository::{get_json, set_json, ClientStore};
use tripbrief_core::CoreResult;
use tripbrief_shared::{BriefHistoryEntry, BriefRecord};

pub const HISTORY_LIMIT: usize = 10;

/// Prepend `entry`, keeping at most `limit` entries, most recent first.
pub fn push_entry(mut history: Vec<BriefHistoryEntry>, entry: BriefHistoryEntry, limit: usize) -> Vec<BriefHistoryEntry> {
    history.retain(|e| e.pending_session_id != entry.pending_session_id);
    history.insert(0, entry);
    history.truncate(limit);
    history
}

pub async fn load_history(store: &dyn ClientStore, client: &ClientId) -> CoreResult<Vec<BriefHistoryEntry>> {
    Ok(get_json(store, client, keys::BRIEF_HISTORY).await?.unwrap_or_default())
}

pub async fn record(
    store: &dyn ClientStore,
    client: &ClientId,
    entry: BriefHistoryEntry,
    limit: usize,
) -> CoreResult<Vec<BriefHistoryEntry>> {
    let history = push_entry(load_history(store, client).await?, entry, limit);
    set_json(store, client, keys::BRIEF_HISTORY, &history).await?;
    Ok(history)
}

/// Assembled HTML of the last brief. Empty when none was generated.
pub async fn load_latest_html(store: &dyn ClientStore, client: &ClientId) -> CoreResult<String> {
    Ok(store.get(client, keys::LATEST_BRIEF_HTML).await?.unwrap_or_default())
}

pub async fn load_latest_record(store: &dyn ClientStore, client: &ClientId) -> CoreResult<Option<BriefRecord>> {
    get_json(store, client, keys::LATEST_BRIEF_JSON).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tripbrief_store::MemoryClientStore;
    use uuid::Uuid;

    fn entry(title: &str) -> BriefHistoryEntry {
        BriefHistoryEntry {
            pending_session_id: Uuid::new_v4(),
            title: title.to_string(),
            destinations: vec![],
            kind: "freeform".into(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_push_keeps_most_recent_first_and_caps() {
        let mut history = Vec::new();
        for i in 0..12 {
            history = push_entry(history, entry(&format!("brief {}", i)), HISTORY_LIMIT);
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].title, "brief 11");
        assert_eq!(history[9].title, "brief 2");
    }

    #[test]
    fn test_same_session_replaces_its_entry() {
        let first = entry("first");
        let mut again = entry("again");
        again.pending_session_id = first.pending_session_id;

        let history = push_entry(vec![first, entry("other")], again, HISTORY_LIMIT);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].title, "again");
    }

    #[tokio::test]
    async fn test_record_persists() {
        let store = MemoryClientStore::new();
        let client = ClientId::parse("c").unwrap();

        record(&store, &client, entry("a"), 3).await.unwrap();
        record(&store, &client, entry("b"), 3).await.unwrap();

        let titles: Vec<String> = load_history(&store, &client).await.unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(load_latest_html(&store, &client).await.unwrap(), "");
    }
}
