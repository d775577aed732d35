pub mod completion;
pub mod draft;
pub mod keys;
pub mod payment;
pub mod repository;
pub mod validation;

pub use draft::DraftStore;
pub use keys::ClientId;
pub use validation::{validate_local, validate_submission, ValidationReport, MAX_TRIP_DAYS};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Client store error: {0}")]
    StoreError(String),
    #[error("Upstream call failed with status {status}: {message}")]
    UpstreamError { status: u16, message: String },
    #[error("Upstream unreachable: {0}")]
    TransportError(String),
    #[error("Backend platform is not configured")]
    NotConfigured,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Message reported by the upstream service, if any. An empty message
    /// means the error body could not be read.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            CoreError::UpstreamError { message, .. } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::InternalError(format!("serialization: {}", err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
