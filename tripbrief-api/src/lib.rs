use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod briefs;
pub mod checkout;
pub mod consent;
pub mod drafts;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod payments;
pub mod sessions;
pub mod state;
pub mod subscriptions;

pub use error::AppError;
pub use state::{AppState, Backends};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::USER_AGENT,
            HeaderName::from_static(middleware::CLIENT_ID_HEADER),
        ]);

    // Everything under /v1 is scoped to one client store
    let client_routes = Router::new()
        .merge(drafts::routes())
        .merge(sessions::routes())
        .merge(checkout::routes())
        .merge(payments::routes())
        .merge(briefs::routes())
        .merge(subscriptions::routes())
        .merge(consent::routes())
        .route_layer(axum::middleware::from_fn(middleware::client_id_middleware));

    Router::new()
        .merge(client_routes)
        .merge(checkout::redirect_routes())
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::circuit_breaker_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let text = state
        .metrics
        .encode_text()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response())
}

/// Per-IP fixed window in Redis. Skipped when there is no Redis or no peer
/// address, and fails open when Redis errors.
async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(req).await;
    };
    let Some(addr) = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0) else {
        return next.run(req).await;
    };

    let key = format!("ratelimit:{}", addr.ip());
    match redis
        .check_rate_limit(&key, state.rate_limit.requests, state.rate_limit.window_seconds)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Rate limit exceeded" })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            next.run(req).await
        }
    }
}
