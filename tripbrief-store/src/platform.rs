use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use tripbrief_core::completion::{CompletionClient, CompletionRequest, CompletionResponse};
use tripbrief_core::payment::{CancelOutcome, CheckoutSession, PaymentGateway, SessionVerification};
use tripbrief_core::repository::PendingSessionRepository;
use tripbrief_core::{CoreError, CoreResult};
use tripbrief_shared::{CheckoutPlan, PendingSession, PlanType};

use crate::app_config::PlatformConfig;
use crate::retry::{with_backoff, RetryPolicy};

const PENDING_SESSIONS_TABLE: &str = "pending_sessions";

/// HTTP client for the managed backend platform: PostgREST tables and
/// serverless functions share one base key.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    config: PlatformConfig,
    retry: RetryPolicy,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CoreError::InternalError(format!("http client: {}", e)))?;

        if !config.is_configured() {
            tracing::warn!("Backend platform URLs are empty; platform calls will be rejected");
        }

        let retry = RetryPolicy::new(
            config.max_retries,
            std::time::Duration::from_millis(config.backoff_base_ms),
        );

        Ok(Self { http, config, retry })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/{}", self.config.functions_url.trim_end_matches('/'), name)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.rest_url.trim_end_matches('/'), table)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> CoreResult<Value> {
        if !self.is_configured() {
            return Err(CoreError::NotConfigured);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::TransportError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::TransportError(e.to_string()))?;

        if !status.is_success() {
            return Err(CoreError::UpstreamError {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_default(),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| CoreError::UpstreamError {
            status: status.as_u16(),
            message: format!("unreadable response body: {}", e),
        })
    }

    /// One POST to a serverless function, no retry.
    pub async fn call_function<B, R>(&self, name: &str, body: &B) -> CoreResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.function_url(name);
        tracing::debug!("POST {}", url);
        let value = self.send(self.request(Method::POST, &url).json(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST to an idempotent read function with backoff on transient errors.
    pub async fn read_function<B, R>(&self, name: &str, body: &B) -> CoreResult<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        with_backoff(&self.retry, name, move || self.call_function(name, body)).await
    }
}

/// Pull a human-readable message out of an error body. Functions answer
/// with `{error}`, PostgREST with `{message}`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "reason"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl PendingSessionRepository for PlatformClient {
    async fn insert(&self, session: &PendingSession) -> CoreResult<Uuid> {
        let url = self.table_url(PENDING_SESSIONS_TABLE);
        let builder = self
            .request(Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(session);

        let rows = self.send(builder).await?;
        let id = rows
            .as_array()
            .and_then(|r| r.first())
            .unwrap_or(&rows)
            .get("id")
            .and_then(Value::as_str)
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| CoreError::InternalError(format!("inserted row id: {}", e)))?;

        // PostgREST may be configured to return nothing; the id was ours anyway.
        Ok(id.unwrap_or(session.id))
    }

    async fn lookup(&self, id: Uuid) -> CoreResult<Option<PendingSession>> {
        let result: CoreResult<Value> = self
            .read_function("get-pending-session", &json!({ "pending_session_id": id }))
            .await;

        let value = match result {
            Ok(v) => v,
            Err(CoreError::UpstreamError { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        let row = value.get("session").cloned().unwrap_or(value);
        if row.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(row)?))
    }

    async fn record_payment(
        &self,
        id: Uuid,
        customer_email: Option<&str>,
        plan: PlanType,
        paid_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let url = format!("{}?id=eq.{}", self.table_url(PENDING_SESSIONS_TABLE), id);
        let body = json!({
            "customer_email": customer_email,
            "has_paid": true,
            "plan_type": plan,
            "paid_at": paid_at,
        });
        self.send(self.request(Method::PATCH, &url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for PlatformClient {
    async fn create_checkout_session(
        &self,
        plan: CheckoutPlan,
        pending_session_id: Uuid,
    ) -> CoreResult<CheckoutSession> {
        self.call_function(
            "create-checkout-session",
            &json!({ "plan": plan, "pending_session_id": pending_session_id }),
        )
        .await
    }

    async fn verify_session(
        &self,
        payment_session_id: &str,
        pending_session_id: Option<Uuid>,
    ) -> CoreResult<SessionVerification> {
        let mut body = json!({ "session_id": payment_session_id });
        if let Some(id) = pending_session_id {
            body["pending_session_id"] = json!(id);
        }
        self.read_function("verify-session-and-status", &body).await
    }

    async fn check_subscription(&self, email: &str) -> CoreResult<bool> {
        let value: Value = self.read_function("check-subscription", &json!({ "email": email })).await?;
        Ok(value.get("is_subscribed").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn cancel_subscription(&self, email: &str) -> CoreResult<CancelOutcome> {
        self.call_function("cancel-subscription", &json!({ "email": email })).await
    }
}

#[async_trait]
impl CompletionClient for PlatformClient {
    async fn complete(&self, request: &CompletionRequest) -> CoreResult<CompletionResponse> {
        self.call_function("generate-travel-brief", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"No such plan"}"#).as_deref(), Some("No such plan"));
        assert_eq!(error_message(r#"{"message":"duplicate key"}"#).as_deref(), Some("duplicate key"));
        assert_eq!(error_message(r#"{"error":""}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_client_rejects_calls() {
        let client = PlatformClient::new(PlatformConfig {
            rest_url: String::new(),
            functions_url: String::new(),
            api_key: String::new(),
            timeout_ms: 1000,
            max_retries: 0,
            backoff_base_ms: 1,
        })
        .unwrap();

        let err = client.check_subscription("a@b.co").await.unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured));
    }
}
