use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use tripbrief_core::repository::{ClientStore, PendingSessionRepository};
use tripbrief_core::{ClientId, CoreError, CoreResult};
use tripbrief_shared::{PendingSession, PlanType};

/// In-process client store for development and tests.
#[derive(Default)]
pub struct MemoryClientStore {
    clients: RwLock<HashMap<ClientId, HashMap<String, String>>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self, client: &ClientId) -> Vec<String> {
        let clients = self.clients.read().await;
        let mut keys: Vec<String> = clients
            .get(client)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn get(&self, client: &ClientId, key: &str) -> CoreResult<Option<String>> {
        let clients = self.clients.read().await;
        Ok(clients.get(client).and_then(|m| m.get(key)).cloned())
    }

    async fn set(&self, client: &ClientId, key: &str, value: &str) -> CoreResult<()> {
        let mut clients = self.clients.write().await;
        clients
            .entry(client.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, client: &ClientId, key: &str) -> CoreResult<()> {
        let mut clients = self.clients.write().await;
        if let Some(m) = clients.get_mut(client) {
            m.remove(key);
        }
        Ok(())
    }
}

/// In-process pending session table. Counts inserts so callers can assert
/// that a rejected draft never reached the backend.
#[derive(Default)]
pub struct MemorySessionRepository {
    rows: RwLock<HashMap<Uuid, PendingSession>>,
    inserts: AtomicUsize,
    fail_inserts: AtomicBool,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Make every following insert fail as the backend would.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, id: Uuid) -> Option<PendingSession> {
        self.rows.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl PendingSessionRepository for MemorySessionRepository {
    async fn insert(&self, session: &PendingSession) -> CoreResult<Uuid> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(CoreError::UpstreamError {
                status: 500,
                message: "insert rejected".to_string(),
            });
        }
        let mut rows = self.rows.write().await;
        if rows.contains_key(&session.id) {
            return Err(CoreError::UpstreamError {
                status: 409,
                message: format!("duplicate key {}", session.id),
            });
        }
        rows.insert(session.id, session.clone());
        Ok(session.id)
    }

    async fn lookup(&self, id: Uuid) -> CoreResult<Option<PendingSession>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn record_payment(
        &self,
        id: Uuid,
        customer_email: Option<&str>,
        plan: PlanType,
        paid_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("pending session {}", id)))?;
        row.record_payment(customer_email.map(str::to_string), plan, paid_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripbrief_shared::TripDraft;

    #[tokio::test]
    async fn test_client_store_roundtrip() {
        let store = MemoryClientStore::new();
        let client = ClientId::parse("abc").unwrap();

        store.set(&client, "k", "v").await.unwrap();
        assert_eq!(store.get(&client, "k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.keys(&client).await, vec!["k".to_string()]);

        store.remove(&client, "k").await.unwrap();
        assert!(store.get(&client, "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_repository_payment_update() {
        let repo = MemorySessionRepository::new();
        let session = PendingSession::from_draft(Uuid::new_v4(), Uuid::new_v4(), &TripDraft::empty());
        let id = repo.insert(&session).await.unwrap();

        repo.record_payment(id, Some("a@b.co"), PlanType::OneTime, Utc::now()).await.unwrap();

        let row = repo.lookup(id).await.unwrap().unwrap();
        assert!(row.has_paid);
        assert_eq!(row.plan_type, PlanType::OneTime);
        assert_eq!(row.customer_email.unwrap().expose(), "a@b.co");
        assert_eq!(repo.insert_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_inserts_are_counted() {
        let repo = MemorySessionRepository::new();
        repo.fail_inserts(true);
        let session = PendingSession::from_draft(Uuid::new_v4(), Uuid::new_v4(), &TripDraft::empty());
        assert!(repo.insert(&session).await.is_err());
        assert_eq!(repo.insert_count(), 1);
        assert!(repo.get(session.id).await.is_none());
    }
}
