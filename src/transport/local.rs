//! In-process assistant, used when no remote backend is configured

use super::{ConverseRequest, ConverseResponse, Transport, TransportError};
use crate::assistant::TemplateAssistant;
use async_trait::async_trait;
use std::sync::Arc;

pub struct LocalTransport {
    assistant: Arc<TemplateAssistant>,
}

impl LocalTransport {
    pub fn new(assistant: Arc<TemplateAssistant>) -> Self {
        Self { assistant }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        self.assistant
            .respond(request)
            .await
            .map_err(|e| TransportError::remote(e.to_string()))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{TemplateCatalog, TemplateDrafter};
    use crate::session::ConversationMessage;
    use crate::state_machine::ConversationState;
    use crate::transport::TransportErrorKind;

    fn transport() -> LocalTransport {
        LocalTransport::new(Arc::new(TemplateAssistant::new(
            TemplateCatalog::builtin(),
            Arc::new(TemplateDrafter),
        )))
    }

    #[tokio::test]
    async fn test_local_transport_answers_start() {
        let request = ConverseRequest::new(
            "d",
            "u",
            vec![ConversationMessage::user("start")],
            ConversationState::default(),
            None,
        );
        let response = transport().converse(&request).await.unwrap();
        assert_eq!(response.message, "Which document would you like to prepare?");
    }

    #[tokio::test]
    async fn test_assistant_errors_become_remote_failures() {
        let request = ConverseRequest::new(
            "d",
            "u",
            vec![ConversationMessage::user("x")],
            ConversationState::gathering("missing"),
            None,
        );
        let err = transport().converse(&request).await.unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Remote);
        assert!(err.message.contains("missing"));
    }
}
