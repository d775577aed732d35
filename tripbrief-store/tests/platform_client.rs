use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use tripbrief_core::completion::{CompletionClient, CompletionRequest};
use tripbrief_core::payment::PaymentGateway;
use tripbrief_core::repository::PendingSessionRepository;
use tripbrief_core::CoreError;
use tripbrief_shared::{CheckoutPlan, Destination, PendingSession, PromptType, TripData, TripDraft};
use tripbrief_store::app_config::PlatformConfig;
use tripbrief_store::PlatformClient;

#[derive(Clone, Default)]
struct FakePlatform {
    verify_calls: Arc<AtomicUsize>,
}

async fn insert_row(headers: HeaderMap, Json(row): Json<Value>) -> (StatusCode, Json<Value>) {
    assert_eq!(headers.get("apikey").unwrap(), "test-key");
    assert_eq!(headers.get("prefer").unwrap(), "return=representation");
    (StatusCode::CREATED, Json(json!([{ "id": row["id"], "status": row["status"] }])))
}

async fn verify(State(fake): State<FakePlatform>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let n = fake.verify_calls.fetch_add(1, Ordering::SeqCst);
    if n == 0 {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "warming up" })));
    }
    assert_eq!(body["session_id"], "cs_test_1");
    (
        StatusCode::OK,
        Json(json!({
            "has_paid": true,
            "reason": null,
            "session_data": {
                "payment_status": "paid",
                "customer_email": "ana@example.com",
                "mode": "payment",
                "amount_total": 1900
            }
        })),
    )
}

async fn checkout(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["plan"] == "yearly" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Yearly plan is not available" })));
    }
    (StatusCode::OK, Json(json!({ "url": "https://pay.example.com/c/cs_test_1" })))
}

async fn lookup() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn generate(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["promptType"], "itinerary");
    assert_eq!(body["tripData"]["destinations"][0]["cityName"], "Hanoi");
    Json(json!({ "success": true, "response": "Day 1\n\nDay 2", "prompt": "p" }))
}

async fn spawn_fake(fake: FakePlatform) -> String {
    let app = Router::new()
        .route("/rest/v1/pending_sessions", post(insert_row))
        .route("/functions/v1/verify-session-and-status", post(verify))
        .route("/functions/v1/create-checkout-session", post(checkout))
        .route("/functions/v1/get-pending-session", post(lookup))
        .route("/functions/v1/generate-travel-brief", post(generate))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base: &str) -> PlatformClient {
    PlatformClient::new(PlatformConfig {
        rest_url: format!("{}/rest/v1", base),
        functions_url: format!("{}/functions/v1", base),
        api_key: "test-key".to_string(),
        timeout_ms: 5_000,
        max_retries: 2,
        backoff_base_ms: 1,
    })
    .unwrap()
}

#[tokio::test]
async fn test_insert_returns_row_id() {
    let base = spawn_fake(FakePlatform::default()).await;
    let client = client_for(&base);

    let session = PendingSession::from_draft(Uuid::new_v4(), Uuid::new_v4(), &TripDraft::empty());
    let id = client.insert(&session).await.unwrap();
    assert_eq!(id, session.id);
}

#[tokio::test]
async fn test_verification_retries_transient_failure() {
    let fake = FakePlatform::default();
    let base = spawn_fake(fake.clone()).await;
    let client = client_for(&base);

    let verification = client.verify_session("cs_test_1", Some(Uuid::new_v4())).await.unwrap();
    assert!(verification.has_paid);
    let data = verification.session_data.unwrap();
    assert_eq!(data.amount_total, Some(1900));
    assert_eq!(data.customer_email.unwrap().expose(), "ana@example.com");
    assert_eq!(fake.verify_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_checkout_error_carries_reported_message() {
    let base = spawn_fake(FakePlatform::default()).await;
    let client = client_for(&base);

    let ok = client.create_checkout_session(CheckoutPlan::Onetime, Uuid::new_v4()).await.unwrap();
    assert_eq!(ok.url, "https://pay.example.com/c/cs_test_1");

    let err = client.create_checkout_session(CheckoutPlan::Yearly, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.upstream_message(), Some("Yearly plan is not available"));
}

#[tokio::test]
async fn test_lookup_not_found_is_none() {
    let base = spawn_fake(FakePlatform::default()).await;
    let client = client_for(&base);
    assert!(client.lookup(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_completion_request_shape() {
    let base = spawn_fake(FakePlatform::default()).await;
    let client = client_for(&base);

    let request = CompletionRequest {
        trip_data: TripData {
            persona: "Family".into(),
            passport_country: "VN".into(),
            start_date: None,
            end_date: None,
            trip_duration: 2,
            destinations: vec![Destination::new("Hanoi", 2)],
            activity_preferences: vec![],
            group_size: 4,
            ages: None,
            budget: None,
            upload_keys: vec![],
            defaults_applied: vec![],
        },
        prompt_type: PromptType::Itinerary,
    };
    let response = client.complete(&request).await.unwrap();
    assert!(response.success);
    assert_eq!(response.response.as_deref(), Some("Day 1\n\nDay 2"));
}

#[tokio::test]
async fn test_unreachable_platform_is_transport_error() {
    let client = client_for("http://127.0.0.1:9");
    let err = client.cancel_subscription("a@b.co").await.unwrap_err();
    assert!(matches!(err, CoreError::TransportError(_)));
}
