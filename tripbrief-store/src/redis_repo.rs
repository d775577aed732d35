use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use tracing::debug;

use tripbrief_core::repository::ClientStore;
use tripbrief_core::{ClientId, CoreError, CoreResult};

/// Redis-backed client store. Each client owns one hash, `client:{id}`,
/// whose expiry is refreshed on every write.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    client_ttl_seconds: u64,
}

impl RedisClient {
    pub async fn new(connection_string: &str, client_ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, client_ttl_seconds })
    }

    fn client_key(client: &ClientId) -> String {
        format!("client:{}", client)
    }

    pub async fn hget_client_field(&self, client: &ClientId, field: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.hget(Self::client_key(client), field).await
    }

    pub async fn hset_client_field(&self, client: &ClientId, field: &str, value: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::client_key(client);
        let _: () = redis::pipe()
            .atomic()
            .hset(&key, field, value)
            .ignore()
            .expire(&key, self.client_ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        debug!("Client field set: {} -> {}", key, field);
        Ok(())
    }

    pub async fn hdel_client_field(&self, client: &ClientId, field: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.hdel(Self::client_key(client), field).await
    }

    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

fn store_error(err: redis::RedisError) -> CoreError {
    CoreError::StoreError(err.to_string())
}

#[async_trait]
impl ClientStore for RedisClient {
    async fn get(&self, client: &ClientId, key: &str) -> CoreResult<Option<String>> {
        self.hget_client_field(client, key).await.map_err(store_error)
    }

    async fn set(&self, client: &ClientId, key: &str, value: &str) -> CoreResult<()> {
        self.hset_client_field(client, key, value).await.map_err(store_error)
    }

    async fn remove(&self, client: &ClientId, key: &str) -> CoreResult<()> {
        self.hdel_client_field(client, key).await.map_err(store_error)
    }
}
