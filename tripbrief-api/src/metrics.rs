//! Prometheus counters for the checkout funnel, plus structured event logs.
//!
//! Each recorder bumps its counter and emits the matching event from
//! `tripbrief_shared::models::events` on the `tripbrief::events` target.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use tripbrief_shared::models::events::{BriefGeneratedEvent, PaymentVerifiedEvent, SessionCreatedEvent};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    sessions_created: IntCounter,
    checkouts: IntCounterVec,
    verifications: IntCounterVec,
    briefs: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let sessions_created = IntCounter::new(
            "tripbrief_sessions_created_total",
            "Pending sessions inserted",
        )?;
        registry.register(Box::new(sessions_created.clone()))?;

        let checkouts = IntCounterVec::new(
            Opts::new("tripbrief_checkouts_total", "Checkout sessions requested"),
            &["plan", "outcome"],
        )?;
        registry.register(Box::new(checkouts.clone()))?;

        let verifications = IntCounterVec::new(
            Opts::new("tripbrief_verifications_total", "Payment verifications"),
            &["outcome"],
        )?;
        registry.register(Box::new(verifications.clone()))?;

        let briefs = IntCounterVec::new(
            Opts::new("tripbrief_briefs_total", "Brief generation attempts"),
            &["outcome", "kind"],
        )?;
        registry.register(Box::new(briefs.clone()))?;

        Ok(Self {
            registry,
            sessions_created,
            checkouts,
            verifications,
            briefs,
        })
    }

    pub fn session_created(&self, event: SessionCreatedEvent) {
        self.sessions_created.inc();
        log_event("session_created", &event);
    }

    pub fn checkout(&self, plan: &str, outcome: &str) {
        self.checkouts.with_label_values(&[plan, outcome]).inc();
    }

    /// `outcome` is one of `paid`, `unpaid` or `failed`.
    pub fn verification(&self, outcome: &str, event: Option<PaymentVerifiedEvent>) {
        self.verifications.with_label_values(&[outcome]).inc();
        if let Some(event) = event {
            log_event("payment_verified", &event);
        }
    }

    pub fn brief_generated(&self, event: BriefGeneratedEvent) {
        self.briefs.with_label_values(&["generated", &event.kind]).inc();
        log_event("brief_generated", &event);
    }

    pub fn brief_outcome(&self, outcome: &str) {
        self.briefs.with_label_values(&[outcome, "none"]).inc();
    }

    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

fn log_event<E: Serialize>(name: &str, event: &E) {
    match serde_json::to_string(event) {
        Ok(payload) => tracing::info!(target: "tripbrief::events", event = name, %payload),
        Err(e) => tracing::warn!("Could not serialize {} event: {}", name, e),
    }
}
