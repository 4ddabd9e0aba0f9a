//! Mock transports for testing
//!
//! These mocks let controller tests script assistant turns without I/O.

use super::{ConverseRequest, ConverseResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued responses
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ConverseResponse, TransportError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ConverseRequest>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: ConverseResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ConverseRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock response queued")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        self.next(request)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Gated Mock Transport (for in-flight testing)
// ============================================================================

/// Mock transport that holds every call until the test releases it
pub struct GatedMockTransport {
    inner: MockTransport,
    /// Notified when a request starts (one permit per request)
    pub request_started: Arc<Notify>,
    /// Notify once per request to let it finish
    pub release: Arc<Notify>,
}

#[allow(dead_code)]
impl GatedMockTransport {
    pub fn new() -> Self {
        Self {
            inner: MockTransport::new(),
            request_started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: ConverseResponse) {
        self.inner.queue_response(response);
    }

    pub fn queue_error(&self, error: TransportError) {
        self.inner.queue_error(error);
    }

    pub fn recorded_requests(&self) -> Vec<ConverseRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl Transport for GatedMockTransport {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        self.request_started.notify_one();
        self.release.notified().await;
        self.inner.next(request)
    }

    fn name(&self) -> &str {
        "gated_mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::ConversationState;

    fn request() -> ConverseRequest {
        ConverseRequest::new("d", "u", vec![], ConversationState::default(), None)
    }

    #[tokio::test]
    async fn test_mock_transport_drains_queue() {
        let mock = MockTransport::new();
        mock.queue_response(ConverseResponse::message("one"));

        assert_eq!(mock.converse(&request()).await.unwrap().message, "one");
        // Second call should fail (no more responses)
        assert!(mock.converse(&request()).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_gated_transport_waits_for_release() {
        let gated = Arc::new(GatedMockTransport::new());
        gated.queue_response(ConverseResponse::message("late"));

        let task = {
            let gated = gated.clone();
            tokio::spawn(async move { gated.converse(&request()).await })
        };

        gated.request_started.notified().await;
        assert!(!task.is_finished());
        gated.release.notify_one();

        let response = task.await.unwrap().unwrap();
        assert_eq!(response.message, "late");
    }
}
