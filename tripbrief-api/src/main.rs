use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripbrief_api::{app, AppState, Backends};
use tripbrief_checkout::MockPaymentGateway;
use tripbrief_core::payment::PaymentGateway;
use tripbrief_core::repository::{ClientStore, PendingSessionRepository};
use tripbrief_store::app_config::{Config, PaymentsMode, StoreBackend};
use tripbrief_store::{MemoryClientStore, MemorySessionRepository, PlatformClient, RedisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripbrief_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting TripBrief API on port {}", config.server.port);

    let (store, redis): (Arc<dyn ClientStore>, Option<Arc<RedisClient>>) = match config.store.backend {
        StoreBackend::Redis => {
            let redis = RedisClient::new(&config.redis.url, config.store.client_ttl_seconds)
                .await
                .context("Failed to connect to Redis")?;
            let redis = Arc::new(redis);
            (redis.clone() as Arc<dyn ClientStore>, Some(redis))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory client store; data is lost on restart");
            (Arc::new(MemoryClientStore::new()) as Arc<dyn ClientStore>, None)
        }
    };

    let platform = Arc::new(PlatformClient::new(config.platform.clone()).context("Failed to build platform client")?);

    let (sessions, gateway): (Arc<dyn PendingSessionRepository>, Arc<dyn PaymentGateway>) = match config.payments.mode {
        PaymentsMode::Live => (
            platform.clone() as Arc<dyn PendingSessionRepository>,
            platform.clone() as Arc<dyn PaymentGateway>,
        ),
        PaymentsMode::Mock => {
            tracing::warn!("Payments are mocked; every checkout verifies as paid");
            (
                Arc::new(MemorySessionRepository::new()) as Arc<dyn PendingSessionRepository>,
                Arc::new(MockPaymentGateway::new(config.payments.mock_checkout_url.clone())) as Arc<dyn PaymentGateway>,
            )
        }
    };

    let backends = Backends {
        store,
        redis,
        sessions,
        gateway,
        completion: platform,
    };
    let app = app(AppState::new(backends, &config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
