use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tripbrief_shared::{PromptType, TripData};

use crate::CoreResult;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub trip_data: TripData,
    pub prompt_type: PromptType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub success: bool,
    /// Raw text, or a JSON-encoded structured brief.
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The AI completion function.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> CoreResult<CompletionResponse>;
}
