//! Provider orchestrator: the retry/fallback ladder.
//!
//! Backends in this domain fail soft and recoverable (burst credit limits,
//! prompt-too-long) far more often than they go hard-down. A single blind
//! attempt would make the product unusable under quota pressure on any one
//! backend, so each call walks an explicit ladder:
//!
//! `Attempting(provider)` → on quota → `Retrying(provider)` with a halved
//! budget → on failure → `FailingOver(next provider)` with the standard
//! budget → … → `Terminal`. Landing on the free-tier default makes its
//! failure terminal, bounding worst-case latency.

use crate::backend::Backend;
use crate::budget;
use shared::chat::{BackendPayload, ConversationTurn, GenerationMode, GenerationRequest};
use shared::error::GenerateError;
use shared::settings::SessionSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One pipeline-level generation job, before any provider is chosen for it.
/// The orchestrator builds a fresh budget-capped [`GenerationRequest`] per
/// attempt.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub prompt: String,
    pub history: Vec<ConversationTurn>,
    pub mode: GenerationMode,
    pub images: Vec<String>,
    pub system_prompt: String,
}

impl GenerationJob {
    fn needs_images(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Successful generation, tagged with the provider that actually served it so
/// the UI and usage accounting reflect any substitution.
#[derive(Debug, Clone)]
pub struct ServedGeneration {
    pub payload: BackendPayload,
    pub served_by: String,
}

/// Ladder position for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum LadderState {
    /// First attempt against a provider, standard budget.
    Attempting { provider: String },
    /// Same-provider retry with the aggressive (halved) budget.
    Retrying { provider: String },
    /// Attempt against a substitute provider, standard budget.
    FailingOver { provider: String },
    /// No further attempts; carries the error surfaced to the caller.
    Terminal { error: GenerateError },
}

impl LadderState {
    fn provider(&self) -> Option<&str> {
        match self {
            LadderState::Attempting { provider }
            | LadderState::Retrying { provider }
            | LadderState::FailingOver { provider } => Some(provider),
            LadderState::Terminal { .. } => None,
        }
    }

    fn is_aggressive(&self) -> bool {
        matches!(self, LadderState::Retrying { .. })
    }
}

pub struct Orchestrator<B: Backend> {
    backend: B,
    settings: SessionSettings,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B, settings: SessionSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Run the ladder for one job, starting from `start_provider`.
    pub async fn generate(
        &self,
        job: &GenerationJob,
        start_provider: &str,
        cancel: &CancellationToken,
    ) -> Result<ServedGeneration, GenerateError> {
        let mut state = LadderState::Attempting {
            provider: start_provider.to_string(),
        };

        loop {
            if cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }
            let provider_id = match state.provider() {
                Some(p) => p.to_string(),
                None => unreachable!("terminal states exit the loop below"),
            };
            let descriptor = match self.settings.descriptor(&provider_id) {
                Some(d) => d,
                None => {
                    return Err(GenerateError::ProvidersExhausted(format!(
                        "unknown provider '{}'",
                        provider_id
                    )))
                }
            };

            let ceiling = if state.is_aggressive() {
                budget::aggressive_ceiling(descriptor.prompt_token_ceiling)
            } else {
                descriptor.prompt_token_ceiling
            };
            let request = GenerationRequest {
                prompt: job.prompt.clone(),
                history: budget::truncate(&job.history, ceiling),
                mode: job.mode,
                provider: provider_id.clone(),
                images: job.images.clone(),
            };
            debug!(
                provider = %provider_id,
                ceiling,
                history_turns = request.history.len(),
                "generation attempt"
            );

            let attempt = tokio::select! {
                _ = cancel.cancelled() => return Err(GenerateError::Cancelled),
                result = self.backend.generate(&request, &job.system_prompt) => result,
            };

            match attempt {
                Ok(payload) => {
                    if provider_id != start_provider {
                        info!(from = %start_provider, to = %provider_id, "served by substitute provider");
                    }
                    return Ok(ServedGeneration {
                        payload,
                        served_by: provider_id,
                    });
                }
                Err(err) => {
                    warn!(provider = %provider_id, error = %err, "attempt failed");
                    match self.next_state(state, err, job.needs_images()) {
                        LadderState::Terminal { error } => return Err(error),
                        next => state = next,
                    }
                }
            }
        }
    }

    /// Pure ladder transition. Kept separate from the driving loop so the
    /// terminal conditions are testable without a backend.
    pub fn next_state(
        &self,
        state: LadderState,
        err: GenerateError,
        needs_images: bool,
    ) -> LadderState {
        if !err.is_recoverable() {
            return LadderState::Terminal { error: err };
        }
        match state {
            LadderState::Attempting { provider } => {
                if err.is_quota() {
                    LadderState::Retrying { provider }
                } else {
                    // Network/timeout: the smaller budget would not help.
                    self.fail_over(&provider, err, needs_images)
                }
            }
            LadderState::Retrying { provider } => self.fail_over(&provider, err, needs_images),
            LadderState::FailingOver { provider } => {
                if self.settings.is_free_tier(&provider) {
                    // Free-tier rung is terminal; surface its own failure.
                    LadderState::Terminal { error: err }
                } else {
                    self.fail_over(&provider, err, needs_images)
                }
            }
            LadderState::Terminal { .. } => state,
        }
    }

    fn fail_over(&self, current: &str, err: GenerateError, needs_images: bool) -> LadderState {
        match self.settings.fallback_after(current, needs_images) {
            Some(next) => LadderState::FailingOver {
                provider: next.id.clone(),
            },
            None => LadderState::Terminal {
                error: GenerateError::ProvidersExhausted(err.to_string()),
            },
        }
    }
}
