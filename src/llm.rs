//! LLM provider abstraction
//!
//! Used by the drafter to polish generated documents.

mod anthropic;
mod error;
mod types;

pub use anthropic::AnthropicService;
pub use error::{LlmError, LlmErrorKind};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Drafting model settings
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    /// Gateway URL; when set the gateway handles authentication
    pub gateway: Option<String>,
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.gateway.is_some() || self.anthropic_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Build the configured service wrapped in logging, if any
    pub fn build_service(&self) -> Result<Option<Arc<dyn LlmService>>, LlmError> {
        if !self.is_configured() {
            return Ok(None);
        }
        // In gateway mode, use "implicit" as the API key
        let api_key = match &self.gateway {
            Some(_) => "implicit".to_string(),
            None => self.anthropic_api_key.clone().unwrap_or_default(),
        };
        let service = AnthropicService::new(api_key, self.model.clone(), self.gateway.as_deref())?;
        Ok(Some(Arc::new(LoggingService::new(Arc::new(service)))))
    }
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    fn model_id(&self) -> &str;
}

/// Times every call and records token usage
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                if !response.end_turn {
                    tracing::warn!(model = %self.model_id, "Draft hit the token limit");
                }
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Draft polished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Draft polishing failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_builds_nothing() {
        let config = LlmConfig::default();
        assert!(!config.is_configured());
        assert!(config.build_service().unwrap().is_none());

        let blank = LlmConfig {
            anthropic_api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        assert!(!blank.is_configured());
    }

    #[test]
    fn test_gateway_mode_builds_service() {
        let config = LlmConfig {
            gateway: Some("http://gw".into()),
            model: Some("claude-test".into()),
            ..LlmConfig::default()
        };
        let service = config.build_service().unwrap().unwrap();
        assert_eq!(service.model_id(), "claude-test");
    }
}
