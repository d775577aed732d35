use serde::Deserialize;
use std::env;
use std::time::Duration;

use tripbrief_shared::PromptType;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub store: StoreConfig,
    pub platform: PlatformConfig,
    pub payments: PaymentsConfig,
    pub rules: TripRules,
    pub brief: BriefConfig,
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub resiliency: ResiliencyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Idle lifetime of a client's keys.
    #[serde(default = "default_client_ttl")]
    pub client_ttl_seconds: u64,
}

fn default_client_ttl() -> u64 { 60 * 60 * 24 * 30 }

/// Managed backend platform: REST tables plus serverless functions.
#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    pub rest_url: String,
    pub functions_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_retries() -> u32 { 3 }
fn default_backoff_base_ms() -> u64 { 200 }

impl PlatformConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_configured(&self) -> bool {
        !self.functions_url.trim().is_empty() && !self.rest_url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentsMode {
    Live,
    Mock,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub mode: PaymentsMode,
    #[serde(default = "default_mock_checkout_url")]
    pub mock_checkout_url: String,
}

fn default_mock_checkout_url() -> String {
    "http://localhost:5173/payment-success".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TripRules {
    #[serde(default = "default_max_trip_days")]
    pub max_trip_days: u32,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_max_trip_days() -> u32 { 21 }
fn default_history_limit() -> usize { 10 }

#[derive(Debug, Deserialize, Clone)]
pub struct BriefConfig {
    #[serde(default)]
    pub default_prompt_type: PromptType,
    #[serde(default = "default_true")]
    pub allow_placeholder_defaults: bool,
    pub support_email: String,
    pub brand_name: String,
}

fn default_true() -> bool { true }

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests: i64,
    pub window_seconds: i64,
}

/// Circuit breakers in front of the payment and brief routes.
#[derive(Debug, Deserialize, Clone)]
pub struct ResiliencyConfig {
    pub failure_threshold: usize,
    pub reset_timeout_seconds: u64,
}

impl Default for ResiliencyConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `TRIPBRIEF_PLATFORM__API_KEY=...`
            .add_source(config::Environment::with_prefix("TRIPBRIEF").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
