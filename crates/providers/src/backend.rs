//! HTTP client for the generation API.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::chat::{BackendPayload, GenerationRequest};
use shared::error::{quota_signature, ErrorCode, GenerateError};
use shared::settings::SessionSettings;
use std::sync::LazyLock;
use std::time::Duration;

/// Fixed per-call ceiling. Exceeding it aborts the attempt as a timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// One generation attempt against a backend. Implemented by the real HTTP
/// client and by the scriptable mock used in tests.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        system_prompt: &str,
    ) -> Result<BackendPayload, GenerateError>;
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    prompt: &'a str,
    system_prompt: &'a str,
    mode: String,
    provider: &'a str,
    history: Vec<WireTurn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WireTurn {
    role: String,
    text: String,
}

/// Failure body: machine-stable `code` plus human-readable `error` detail.
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: String,
}

pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            base_url: settings.api_base_url.clone(),
        }
    }

    fn classify_failure(status: reqwest::StatusCode, body: &str) -> GenerateError {
        let detail: String = body.chars().take(800).collect();
        match serde_json::from_str::<WireError>(body) {
            Ok(wire) => {
                let code = wire
                    .code
                    .as_deref()
                    .map(ErrorCode::from_wire)
                    .unwrap_or(ErrorCode::Unknown);
                let detail = if wire.error.is_empty() {
                    detail
                } else {
                    wire.error
                };
                if code.is_recoverable() {
                    GenerateError::Quota { code, detail }
                } else if code == ErrorCode::Unknown && quota_signature(&detail) {
                    // Legacy backends without a code field.
                    GenerateError::Quota {
                        code: ErrorCode::QuotaExceeded,
                        detail,
                    }
                } else {
                    GenerateError::Network(format!("{}: {}", status, detail))
                }
            }
            Err(_) => GenerateError::Network(format!("{}: {}", status, detail)),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
        system_prompt: &str,
    ) -> Result<BackendPayload, GenerateError> {
        let url = format!("{}/generate", self.base_url);
        let wire = WireRequest {
            prompt: &request.prompt,
            system_prompt,
            mode: request.mode.to_string(),
            provider: &request.provider,
            history: request
                .history
                .iter()
                .map(|t| WireTurn {
                    role: t.role.to_string(),
                    text: t.text.clone(),
                })
                .collect(),
            images: request.images.clone(),
        };

        let resp = self
            .http
            .post(url)
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout(REQUEST_TIMEOUT_SECS)
                } else {
                    GenerateError::Network(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| GenerateError::Network(e.to_string()))?;
        let payload: BackendPayload = serde_json::from_str(&body)
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

        if payload.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        Ok(payload)
    }
}

/// Encode raw image bytes as a data URI for the wire `images` field.
pub fn image_data_uri(bytes: &[u8], mime: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, encoded)
}
