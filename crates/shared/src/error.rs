//! Upstream and extraction error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-stable error category carried on backend failure responses.
///
/// Detection used to key off substrings in the human-readable detail string,
/// which breaks whenever upstream rewords an error. The wire now carries this
/// code; the substring check survives only as a fallback for backends that
/// predate it (see [`quota_signature`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    QuotaExceeded,
    PromptTooLong,
    RateLimited,
    Internal,
    Unknown,
}

impl ErrorCode {
    /// Recoverable codes trigger the orchestrator's retry/fallback ladder.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            ErrorCode::QuotaExceeded | ErrorCode::PromptTooLong | ErrorCode::RateLimited
        )
    }

    pub fn from_wire(code: &str) -> Self {
        match code {
            "quota_exceeded" => ErrorCode::QuotaExceeded,
            "prompt_too_long" => ErrorCode::PromptTooLong,
            "rate_limited" => ErrorCode::RateLimited,
            "internal" => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }
}

/// Errors a single generation attempt can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream timed out after {0}s")]
    Timeout(u64),

    /// Credit/quota/prompt-size rejection. Recoverable via retry or fallback.
    #[error("upstream rejected the request ({code:?}): {detail}")]
    Quota { code: ErrorCode, detail: String },

    #[error("upstream returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("upstream returned an empty response")]
    EmptyResponse,

    #[error("generation cancelled")]
    Cancelled,

    /// Terminal: every rung of the fallback ladder failed.
    #[error("all providers exhausted; last error: {0}")]
    ProvidersExhausted(String),
}

impl GenerateError {
    /// Whether this failure should drive the retry/fallback ladder.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GenerateError::Quota { code, .. } => code.is_recoverable(),
            GenerateError::Timeout(_) | GenerateError::Network(_) => true,
            _ => false,
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, GenerateError::Quota { .. })
    }
}

/// Legacy substring sniff over a human-readable error detail. Known-brittle;
/// only consulted when the wire carries no usable [`ErrorCode`].
pub fn quota_signature(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    const SIGNATURES: &[&str] = &[
        "credit",
        "quota",
        "usage limit",
        "token limit",
        "prompt too long",
        "context length",
        "rate limit",
    ];
    SIGNATURES.iter().any(|s| lower.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_round_trip() {
        assert_eq!(ErrorCode::from_wire("quota_exceeded"), ErrorCode::QuotaExceeded);
        assert_eq!(ErrorCode::from_wire("something_new"), ErrorCode::Unknown);
    }

    #[test]
    fn recoverable_codes() {
        assert!(ErrorCode::QuotaExceeded.is_recoverable());
        assert!(ErrorCode::PromptTooLong.is_recoverable());
        assert!(!ErrorCode::Internal.is_recoverable());
    }

    #[test]
    fn quota_signature_matches_known_wordings() {
        assert!(quota_signature("You have exceeded your usage limit for today"));
        assert!(quota_signature("Insufficient credit balance"));
        assert!(quota_signature("Prompt too long: 40000 tokens"));
        assert!(!quota_signature("service temporarily unavailable"));
    }

    #[test]
    fn errors_compare_by_structure() {
        assert_eq!(GenerateError::Timeout(30), GenerateError::Timeout(30));
        assert_ne!(
            GenerateError::Timeout(30),
            GenerateError::Network("connection reset".into())
        );
    }

    #[test]
    fn cancelled_is_not_recoverable() {
        assert!(!GenerateError::Cancelled.is_recoverable());
        assert!(GenerateError::Timeout(30).is_recoverable());
    }
}
