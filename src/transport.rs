//! Transport to the remote assistant operation
//!
//! Turns a transcript plus machine state into the next assistant turn.

mod edge;
mod error;
mod local;
mod types;

#[cfg(test)]
pub mod testing;

pub use edge::EdgeFunctionTransport;
pub use error::{TransportError, TransportErrorKind};
pub use local::LocalTransport;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one assistant turn
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        (**self).converse(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport {
    inner: Arc<dyn Transport>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.converse(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    transport = %self.inner.name(),
                    deal_id = %request.deal_id,
                    duration_ms = %duration.as_millis(),
                    phase = %request.conversational_state.phase,
                    next_phase = ?response.state.as_ref().map(|s| s.phase),
                    is_complete = response.is_complete.unwrap_or(false),
                    "Assistant turn completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    transport = %self.inner.name(),
                    deal_id = %request.deal_id,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    status = ?e.status,
                    error = %e.message,
                    "Assistant turn failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
