use std::sync::Arc;

use tripbrief_brief::{BriefOrchestrator, BriefSettings, Branding, TripDataResolver};
use tripbrief_checkout::{CheckoutOrchestrator, SubscriptionService};
use tripbrief_core::completion::CompletionClient;
use tripbrief_core::payment::PaymentGateway;
use tripbrief_core::repository::{ClientStore, PendingSessionRepository};
use tripbrief_core::DraftStore;
use tripbrief_store::app_config::{Config, RateLimitConfig, TripRules};
use tripbrief_store::RedisClient;

use crate::metrics::{ApiMetrics, MetricsError};
use crate::middleware::ResiliencyState;

/// Storage and outbound services the API is wired to.
pub struct Backends {
    pub store: Arc<dyn ClientStore>,
    /// Present when the client store is Redis; also backs rate limiting.
    pub redis: Option<Arc<RedisClient>>,
    pub sessions: Arc<dyn PendingSessionRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub completion: Arc<dyn CompletionClient>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClientStore>,
    pub redis: Option<Arc<RedisClient>>,
    pub sessions: Arc<dyn PendingSessionRepository>,
    pub drafts: DraftStore,
    pub checkout: Arc<CheckoutOrchestrator>,
    pub subscriptions: Arc<SubscriptionService>,
    pub briefs: Arc<BriefOrchestrator>,
    pub rules: TripRules,
    pub rate_limit: RateLimitConfig,
    pub support_email: String,
    pub metrics: Arc<ApiMetrics>,
    pub resiliency: Arc<ResiliencyState>,
}

impl AppState {
    pub fn new(backends: Backends, config: &Config) -> Result<Self, MetricsError> {
        let Backends {
            store,
            redis,
            sessions,
            gateway,
            completion,
        } = backends;

        let checkout = CheckoutOrchestrator::new(sessions.clone(), gateway.clone(), store.clone())
            .with_max_trip_days(config.rules.max_trip_days);

        let resolver = TripDataResolver::new(
            store.clone(),
            sessions.clone(),
            config.brief.allow_placeholder_defaults,
        );
        let settings = BriefSettings {
            prompt_type: config.brief.default_prompt_type,
            history_limit: config.rules.history_limit,
            branding: Branding {
                brand_name: config.brief.brand_name.clone(),
                support_email: config.brief.support_email.clone(),
            },
        };

        Ok(Self {
            drafts: DraftStore::new(store.clone()),
            checkout: Arc::new(checkout),
            subscriptions: Arc::new(SubscriptionService::new(gateway, store.clone())),
            briefs: Arc::new(BriefOrchestrator::new(resolver, completion, store.clone(), settings)),
            store,
            redis,
            sessions,
            rules: config.rules.clone(),
            rate_limit: config.rate_limit.clone(),
            support_email: config.brief.support_email.clone(),
            metrics: Arc::new(ApiMetrics::new()?),
            resiliency: Arc::new(ResiliencyState::new(&config.resiliency)),
        })
    }
}
