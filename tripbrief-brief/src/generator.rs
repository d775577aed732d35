use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

use tripbrief_core::completion::{CompletionClient, CompletionRequest};
use tripbrief_core::keys::{self, ClientId};
use tripbrief_core::repository::{set_json, ClientStore};
use tripbrief_core::CoreError;
use tripbrief_shared::{BriefContent, BriefHistoryEntry, BriefRecord, PromptType, TripData};

use crate::history::{self, HISTORY_LIMIT};
use crate::parser::parse_brief;
use crate::render::{brief_title, render_document, Branding};
use crate::trip_data::TripDataResolver;

#[derive(Debug, thiserror::Error)]
pub enum BriefError {
    #[error("Trip data unavailable: missing {0}")]
    TripDataUnavailable(String),

    #[error("{0}")]
    Completion(String),

    #[error("Backend platform is not configured")]
    NotConfigured,

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Debug)]
pub enum GenerationOutcome {
    Generated(GeneratedBrief),
    AlreadyInProgress,
    AlreadyGenerated,
    Aborted,
}

#[derive(Debug, Clone)]
pub struct GeneratedBrief {
    pub pending_session_id: Uuid,
    pub content: BriefContent,
    pub html: String,
    pub trip_data: TripData,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BriefSettings {
    pub prompt_type: PromptType,
    pub history_limit: usize,
    pub branding: Branding,
}

impl Default for BriefSettings {
    fn default() -> Self {
        Self {
            prompt_type: PromptType::TravelBrief,
            history_limit: HISTORY_LIMIT,
            branding: Branding::default(),
        }
    }
}

enum Admission {
    InProgress,
}

/// Allows one generation per pending session at a time. It only tracks
/// work in flight; finished briefs are recognised from the client's
/// history. The lock is never held across an await.
#[derive(Default)]
pub struct GenerationGuard {
    in_flight: Mutex<HashSet<Uuid>>,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn admit(guard: &Arc<Self>, id: Uuid) -> Result<GuardPermit, Admission> {
        if !guard.lock().insert(id) {
            return Err(Admission::InProgress);
        }
        Ok(GuardPermit {
            guard: Arc::clone(guard),
            id,
        })
    }

    pub fn is_in_flight(&self, id: Uuid) -> bool {
        self.lock().contains(&id)
    }

    /// Number of pending sessions currently being generated.
    pub fn in_flight_count(&self) -> usize {
        self.lock().len()
    }
}

/// Releases the in-flight slot when dropped, including when the request
/// future is cancelled mid-generation.
struct GuardPermit {
    guard: Arc<GenerationGuard>,
    id: Uuid,
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        self.guard.lock().remove(&self.id);
    }
}

/// Produces the travel brief after payment and caches it for export.
pub struct BriefOrchestrator {
    resolver: TripDataResolver,
    completion: Arc<dyn CompletionClient>,
    store: Arc<dyn ClientStore>,
    guard: Arc<GenerationGuard>,
    settings: BriefSettings,
}

impl BriefOrchestrator {
    pub fn new(
        resolver: TripDataResolver,
        completion: Arc<dyn CompletionClient>,
        store: Arc<dyn ClientStore>,
        settings: BriefSettings,
    ) -> Self {
        Self {
            resolver,
            completion,
            store,
            guard: Arc::new(GenerationGuard::new()),
            settings,
        }
    }

    pub fn guard(&self) -> &GenerationGuard {
        &self.guard
    }

    /// Generate the brief for `pending_session_id`.
    ///
    /// When `abort` resolves before the completion call returns, nothing
    /// is written and the outcome is `Aborted`.
    pub async fn generate<A>(
        &self,
        client: &ClientId,
        pending_session_id: Uuid,
        prompt_type: Option<PromptType>,
        abort: A,
    ) -> Result<GenerationOutcome, BriefError>
    where
        A: Future<Output = ()>,
    {
        let _permit = match GenerationGuard::admit(&self.guard, pending_session_id) {
            Ok(permit) => permit,
            Err(Admission::InProgress) => {
                info!("Brief for {} already in progress", pending_session_id);
                return Ok(GenerationOutcome::AlreadyInProgress);
            }
        };

        // Checked under the permit so a generation finishing concurrently
        // is already in the history
        let previous = history::load_history(self.store.as_ref(), client).await?;
        if previous.iter().any(|entry| entry.pending_session_id == pending_session_id) {
            info!("Brief for {} already generated", pending_session_id);
            return Ok(GenerationOutcome::AlreadyGenerated);
        }

        let trip_data = self.resolver.resolve(client, pending_session_id).await?;
        let request = CompletionRequest {
            trip_data: trip_data.clone(),
            prompt_type: prompt_type.unwrap_or(self.settings.prompt_type),
        };

        tokio::pin!(abort);
        let response = tokio::select! {
            biased;
            _ = &mut abort => {
                info!("Brief generation for {} aborted", pending_session_id);
                return Ok(GenerationOutcome::Aborted);
            }
            response = self.completion.complete(&request) => response,
        };

        let response = response.map_err(|e| match e {
            CoreError::NotConfigured => BriefError::NotConfigured,
            other => {
                error!("Brief generation for {} failed: {}", pending_session_id, other);
                BriefError::Completion(
                    other
                        .upstream_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| "Failed to generate travel brief".to_string()),
                )
            }
        })?;

        if !response.success {
            let message = response.error.unwrap_or_else(|| "Failed to generate travel brief".to_string());
            error!("Brief generation for {} rejected: {}", pending_session_id, message);
            return Err(BriefError::Completion(message));
        }
        let raw = response.response.unwrap_or_default();
        if raw.trim().is_empty() {
            return Err(BriefError::Completion("The brief generator returned an empty response".to_string()));
        }

        let generated_at = Utc::now();
        let content = parse_brief(&raw);
        let html = render_document(&self.settings.branding, &trip_data, &content, generated_at);

        self.persist(client, pending_session_id, &raw, response.prompt, &trip_data, &content, &html, generated_at)
            .await?;

        info!(
            "Brief for {} generated ({}, {} placeholder fields)",
            pending_session_id,
            content.kind(),
            trip_data.defaults_applied.len()
        );
        Ok(GenerationOutcome::Generated(GeneratedBrief {
            pending_session_id,
            content,
            html,
            trip_data,
            generated_at,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist(
        &self,
        client: &ClientId,
        pending_session_id: Uuid,
        raw: &str,
        prompt: Option<String>,
        trip_data: &TripData,
        content: &BriefContent,
        html: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), BriefError> {
        let store = self.store.as_ref();

        let record = BriefRecord {
            response: raw.to_string(),
            prompt,
            trip_data: trip_data.clone(),
            generated_at,
        };
        set_json(store, client, keys::LATEST_BRIEF_JSON, &record).await?;
        store.set(client, keys::LATEST_BRIEF_HTML, html).await?;

        let entry = BriefHistoryEntry {
            pending_session_id,
            title: brief_title(trip_data, content),
            destinations: trip_data.destinations.iter().map(|d| d.city_name.clone()).collect(),
            kind: content.kind().to_string(),
            generated_at,
        };
        history::record(store, client, entry, self.settings.history_limit).await?;

        // Only clear the id this brief was generated for
        match store.get(client, keys::PENDING_SESSION_ID).await? {
            Some(stored) if stored.trim() == pending_session_id.to_string() => {
                store.remove(client, keys::PENDING_SESSION_ID).await?;
            }
            Some(_) => warn!("Pending session id changed during generation; leaving it in place"),
            None => {}
        }
        Ok(())
    }
}
