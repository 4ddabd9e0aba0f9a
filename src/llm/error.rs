//! LLM error types

use thiserror::Error;

/// Drafting-model failure, classified by HTTP outcome
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Decode, message)
    }

    /// Classify a non-success HTTP response from the provider
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = provider_message(body).unwrap_or_else(|| body.to_string());
        match status {
            401 | 403 => Self::new(LlmErrorKind::Auth, format!("Drafting model rejected credentials: {detail}")),
            429 => Self::new(LlmErrorKind::RateLimit, format!("Drafting model is rate limited: {detail}")),
            400 => Self::new(LlmErrorKind::InvalidRequest, format!("Drafting prompt was rejected: {detail}")),
            500..=599 => Self::new(LlmErrorKind::ServerError, format!("Drafting model unavailable: {detail}")),
            _ => Self::new(LlmErrorKind::Unknown, format!("Drafting model returned HTTP {status}: {detail}")),
        }
    }
}

/// `error.message` from a provider error envelope
fn provider_message(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed
        .pointer("/error/message")?
        .as_str()
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    Network,
    RateLimit,
    ServerError,
    Auth,
    InvalidRequest,
    Decode,
    Unknown,
}

impl LlmErrorKind {
    /// Whether trying the same prompt later could succeed
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
