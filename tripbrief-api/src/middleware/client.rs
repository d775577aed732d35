use axum::{extract::Request, middleware::Next, response::Response};

use tripbrief_core::ClientId;

use crate::error::AppError;

pub const CLIENT_ID_HEADER: &str = "x-client-id";

// ============================================================================
// Client Identification Middleware
// ============================================================================

/// Resolve the browser's client-store id from `x-client-id` and make it
/// available to handlers as `Extension<ClientId>`.
pub async fn client_id_middleware(mut req: Request, next: Next) -> Result<Response, AppError> {
    let raw = req
        .headers()
        .get(CLIENT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::validation("Missing x-client-id header"))?;

    let client = ClientId::parse(raw)?;
    req.extensions_mut().insert(client);

    Ok(next.run(req).await)
}
