use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use tripbrief_shared::{PendingSession, PlanType};

use crate::keys::ClientId;
use crate::CoreResult;

/// Per-client keyed string storage. Last writer wins; there is no
/// versioning or conflict detection.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get(&self, client: &ClientId, key: &str) -> CoreResult<Option<String>>;

    async fn set(&self, client: &ClientId, key: &str, value: &str) -> CoreResult<()>;

    async fn remove(&self, client: &ClientId, key: &str) -> CoreResult<()>;
}

/// Read a JSON value. A value that no longer parses is treated as absent.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn ClientStore,
    client: &ClientId,
    key: &str,
) -> CoreResult<Option<T>> {
    match store.get(client, key).await? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Discarding unreadable client value {} for {}: {}", key, client, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn ClientStore,
    client: &ClientId,
    key: &str,
    value: &T,
) -> CoreResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(client, key, &raw).await
}

/// Pending sessions as held by the backend platform.
#[async_trait]
pub trait PendingSessionRepository: Send + Sync {
    /// Insert one row. Not idempotent: each call creates a new record.
    async fn insert(&self, session: &PendingSession) -> CoreResult<Uuid>;

    async fn lookup(&self, id: Uuid) -> CoreResult<Option<PendingSession>>;

    async fn record_payment(
        &self,
        id: Uuid,
        customer_email: Option<&str>,
        plan: PlanType,
        paid_at: DateTime<Utc>,
    ) -> CoreResult<()>;
}
