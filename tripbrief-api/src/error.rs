use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tripbrief_brief::BriefError;
use tripbrief_checkout::{CheckoutError, JourneyError};
use tripbrief_core::CoreError;

const UPSTREAM_FAILED: &str = "Upstream service failed. Please try again.";
const NOT_CONFIGURED: &str = "Service is not configured";

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<String>),
    NotFoundError(String),
    ConflictError(String),
    PaymentRequired(String),
    UpstreamError(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![message.into()])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the traveler.
    pub fn message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => errors
                .first()
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string()),
            AppError::NotFoundError(msg)
            | AppError::ConflictError(msg)
            | AppError::PaymentRequired(msg)
            | AppError::UpstreamError(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
            AppError::InternalServerError(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::ValidationError(errors) => json!({
                "error": self.message(),
                "errors": errors,
            }),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                json!({ "error": self.message() })
            }
            _ => json!({ "error": self.message() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(vec![msg]),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::NotConfigured => AppError::ServiceUnavailable(NOT_CONFIGURED.to_string()),
            CoreError::UpstreamError { .. } | CoreError::TransportError(_) => {
                tracing::error!("Upstream call failed: {}", err);
                AppError::UpstreamError(UPSTREAM_FAILED.to_string())
            }
            CoreError::StoreError(_) | CoreError::InternalError(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::DurationExceeded(msg) => AppError::ValidationError(vec![msg]),
            CheckoutError::NoPendingSession => AppError::NotFoundError(err.to_string()),
            CheckoutError::NotConfigured => AppError::ServiceUnavailable(NOT_CONFIGURED.to_string()),
            CheckoutError::SessionCreation | CheckoutError::VerificationFailed(_) => {
                AppError::UpstreamError(err.to_string())
            }
            CheckoutError::CheckoutFailed(msg) | CheckoutError::SubscriptionFailed(msg) => {
                AppError::UpstreamError(msg)
            }
            CheckoutError::Core(core) => core.into(),
        }
    }
}

impl From<BriefError> for AppError {
    fn from(err: BriefError) -> Self {
        match err {
            BriefError::TripDataUnavailable(_) => AppError::ConflictError(err.to_string()),
            BriefError::Completion(msg) => AppError::UpstreamError(msg),
            BriefError::NotConfigured => AppError::ServiceUnavailable(NOT_CONFIGURED.to_string()),
            BriefError::Core(core) => core.into(),
        }
    }
}

impl From<JourneyError> for AppError {
    fn from(err: JourneyError) -> Self {
        AppError::ConflictError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_errors_keep_generic_messages() {
        let err = AppError::from(CheckoutError::SessionCreation);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "Failed to create session");

        let err = AppError::from(CheckoutError::NoPendingSession);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "No pending session found. Please start planning again.");

        let err = AppError::from(CheckoutError::DurationExceeded("too long".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_details_are_not_leaked() {
        let err = AppError::from(CoreError::UpstreamError {
            status: 500,
            message: "relation pending_sessions does not exist".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(!err.message().contains("relation"));

        let err = AppError::from(CoreError::StoreError("connection refused".into()));
        assert_eq!(err.message(), "Internal Server Error");
    }

    #[test]
    fn test_not_configured_is_unavailable() {
        assert_eq!(AppError::from(BriefError::NotConfigured).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::from(CheckoutError::Core(CoreError::NotConfigured)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
