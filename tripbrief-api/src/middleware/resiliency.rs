use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use tripbrief_store::app_config::ResiliencyConfig;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen, // one trial request at a time
}

pub struct CircuitBreaker {
    pub name: String,
    pub state: RwLock<CircuitState>,
    pub failure_count: AtomicUsize,
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
    pub last_failure: RwLock<Option<Instant>>,
    trial_started: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
            trial_started: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a request may pass. An open circuit half-opens once the
    /// reset timeout has elapsed, and a half-open circuit lets a single
    /// trial request through until it reports back.
    pub async fn check(&self) -> bool {
        if *self.state.read().await == CircuitState::Closed {
            return true;
        }

        let mut state = self.state.write().await;
        match *state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => self.take_trial().await,
            CircuitState::Open => {
                let last_failure = *self.last_failure.read().await;
                match last_failure {
                    Some(instant) if instant.elapsed() > self.reset_timeout => {
                        *state = CircuitState::HalfOpen;
                        tracing::info!("Circuit breaker [{}] moving to half-open", self.name);
                        self.take_trial().await
                    }
                    _ => false,
                }
            }
        }
    }

    /// A trial whose request was dropped without reporting is replaced
    /// after another reset timeout.
    async fn take_trial(&self) -> bool {
        let mut trial = self.trial_started.write().await;
        match *trial {
            Some(started) if started.elapsed() <= self.reset_timeout => false,
            _ => {
                *trial = Some(Instant::now());
                true
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            tracing::info!("Circuit breaker [{}] recovered", self.name);
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
        *self.trial_started.write().await = None;
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            *self.last_failure.write().await = Some(Instant::now());
            tracing::error!("Circuit breaker [{}] open after {} failures", self.name, count);
        }
        *self.trial_started.write().await = None;
    }
}

/// Breakers for the routes that call the payment processor and the AI
/// function.
pub struct ResiliencyState {
    pub payment_cb: CircuitBreaker,
    pub brief_cb: CircuitBreaker,
}

impl ResiliencyState {
    pub fn new(config: &ResiliencyConfig) -> Self {
        let timeout = Duration::from_secs(config.reset_timeout_seconds);
        Self {
            payment_cb: CircuitBreaker::new("payments", config.failure_threshold, timeout),
            brief_cb: CircuitBreaker::new("briefs", config.failure_threshold, timeout),
        }
    }
}

pub async fn circuit_breaker_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    let cb = if path.starts_with("/v1/payments") || path.starts_with("/v1/checkout") {
        Some(&state.resiliency.payment_cb)
    } else if path == "/v1/briefs" {
        Some(&state.resiliency.brief_cb)
    } else {
        None
    };

    let Some(cb) = cb else {
        return next.run(req).await;
    };

    if !cb.check().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": format!("Circuit breaker [{}] is open", cb.name) })),
        )
            .into_response();
    }

    let response = next.run(req).await;
    if response.status().is_server_error() {
        cb.record_failure().await;
    } else {
        cb.record_success().await;
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trips_after_threshold() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_secs(60));
        cb.record_failure().await;
        assert!(cb.check().await);
        cb.record_failure().await;
        assert_eq!(cb.current().await, CircuitState::Open);
        assert!(!cb.check().await);
    }

    #[tokio::test]
    async fn test_half_open_trial_recovers() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_millis(0));
        cb.record_failure().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(cb.check().await);
        assert_eq!(cb.current().await, CircuitState::HalfOpen);
        cb.record_success().await;
        assert_eq!(cb.current().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_admits_one_request_at_a_time() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_millis(50));
        cb.record_failure().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(cb.check().await);
        assert!(!cb.check().await);
        assert!(!cb.check().await);
        assert_eq!(cb.current().await, CircuitState::HalfOpen);

        cb.record_success().await;
        assert!(cb.check().await);
        assert!(cb.check().await);
    }

    #[tokio::test]
    async fn test_failed_trial_reopens() {
        let cb = CircuitBreaker::new("test", 3, Duration::from_millis(0));
        for _ in 0..3 {
            cb.record_failure().await;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cb.check().await);
        cb.record_failure().await;
        assert_eq!(cb.current().await, CircuitState::Open);
    }
}
