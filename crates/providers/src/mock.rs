//! Scriptable backend for orchestrator and pipeline tests.

use crate::backend::Backend;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::chat::{BackendPayload, GenerationRequest};
use shared::error::GenerateError;
use std::collections::VecDeque;

/// Test backend that replays a scripted sequence of outcomes and records
/// every request it sees. When the script runs dry it repeats `fallback`.
#[derive(Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<BackendPayload, GenerateError>>>,
    fallback: Option<GenerateError>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockBackend {
    pub fn script(outcomes: Vec<Result<BackendPayload, GenerateError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a clone of `err`.
    pub fn always_fail(err: GenerateError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// First call fails with `err`, every later call succeeds with `payload`.
    pub fn fail_then_succeed(err: GenerateError, payload: BackendPayload) -> Self {
        Self::script(vec![Err(err), Ok(payload)])
    }

    /// Every call succeeds with a clone of `payload`.
    pub fn always_ok(payload: BackendPayload) -> Self {
        let mut mock = Self::script(vec![Ok(payload.clone())]);
        let mut script = mock.script.lock();
        for _ in 0..16 {
            script.push_back(Ok(payload.clone()));
        }
        drop(script);
        mock.fallback = Some(GenerateError::EmptyResponse);
        mock
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _system_prompt: &str,
    ) -> Result<BackendPayload, GenerateError> {
        self.requests.lock().push(request.clone());
        if let Some(outcome) = self.script.lock().pop_front() {
            return outcome;
        }
        match &self.fallback {
            Some(err) => Err(err.clone()),
            None => Err(GenerateError::EmptyResponse),
        }
    }
}
