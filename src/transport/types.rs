//! Wire types for the `conversational_template` operation

use super::TransportError;
use crate::deal::DealContext;
use crate::session::{ConversationMessage, QuickOption, Role};
use crate::state_machine::ConversationState;
use serde::{Deserialize, Serialize};

/// Operation name the assistant dispatches on
pub const CONVERSATIONAL_TEMPLATE: &str = "conversational_template";

/// One assistant turn request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    pub operation: String,
    pub deal_id: String,
    pub user_id: String,
    /// Full transcript, including the user turn being sent
    pub messages: Vec<ConversationMessage>,
    #[serde(default)]
    pub conversational_state: ConversationState,
    #[serde(default)]
    pub context: RequestContext,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_context: Option<DealContext>,
}

impl ConverseRequest {
    pub fn new(
        deal_id: impl Into<String>,
        user_id: impl Into<String>,
        messages: Vec<ConversationMessage>,
        conversational_state: ConversationState,
        deal_context: Option<DealContext>,
    ) -> Self {
        Self {
            operation: CONVERSATIONAL_TEMPLATE.to_string(),
            deal_id: deal_id.into(),
            user_id: user_id.into(),
            messages,
            conversational_state,
            context: RequestContext { deal_context },
        }
    }

    /// Text of the most recent user turn
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn deal_context(&self) -> Option<&DealContext> {
        self.context.deal_context.as_ref()
    }
}

/// One assistant turn response. Every field but `message` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ConversationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuickOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConverseResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: ConversationState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_options(mut self, options: Vec<QuickOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn completed(mut self, document: impl Into<String>, disclaimer: impl Into<String>) -> Self {
        self.is_complete = Some(true);
        self.generated_document = Some(document.into());
        self.disclaimer = Some(disclaimer.into());
        self
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Decode a success-status body.
    ///
    /// An `error` field fails the turn even when the body has no `message`;
    /// otherwise `message` is required.
    pub fn from_body(body: &str) -> Result<Self, TransportError> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| TransportError::decode(format!("Failed to parse response: {e}")))?;
        if let Some(error) = value.get("error").and_then(serde_json::Value::as_str) {
            return Err(TransportError::remote(error));
        }
        serde_json::from_value(value)
            .map_err(|e| TransportError::decode(format!("Failed to parse response: {e}")))
    }

    /// Treat an error-shaped response as a failed turn
    pub fn into_result(self) -> Result<Self, TransportError> {
        match self.error {
            Some(error) => Err(TransportError::remote(error)),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::Phase;
    use crate::transport::TransportErrorKind;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = ConverseRequest::new(
            "deal-1",
            "user-1",
            vec![ConversationMessage::user("start")],
            ConversationState::default(),
            Some(DealContext {
                business_name: Some("Acme Ltd".into()),
                ..DealContext::default()
            }),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operation"], "conversational_template");
        assert_eq!(value["dealId"], "deal-1");
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["messages"][0], json!({ "role": "user", "content": "start" }));
        assert_eq!(value["conversationalState"]["phase"], "select_type");
        assert_eq!(
            value["context"]["dealContext"]["businessName"],
            "Acme Ltd"
        );
    }

    #[test]
    fn test_request_without_deal_omits_context_field() {
        let request =
            ConverseRequest::new("d", "u", vec![], ConversationState::default(), None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["context"], json!({}));
    }

    #[test]
    fn test_last_user_message_skips_assistant_turns() {
        let request = ConverseRequest::new(
            "d",
            "u",
            vec![
                ConversationMessage::user("start"),
                ConversationMessage::assistant("Which document?"),
                ConversationMessage::user("nda"),
                ConversationMessage::assistant("Who is disclosing?"),
            ],
            ConversationState::default(),
            None,
        );
        assert_eq!(request.last_user_message(), Some("nda"));
    }

    #[test]
    fn test_minimal_response_decodes() {
        let response: ConverseResponse =
            serde_json::from_value(json!({ "message": "What type of document?" })).unwrap();
        assert_eq!(response.message, "What type of document?");
        assert!(response.state.is_none());
        assert!(response.options.is_none());
        assert!(response.is_complete.is_none());
    }

    #[test]
    fn test_body_without_message_is_a_decode_error() {
        let err = ConverseResponse::from_body(r#"{"options":[]}"#).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Decode);
        assert!(err.message.contains("message"));

        let err = ConverseResponse::from_body("not json").unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Decode);
    }

    #[test]
    fn test_error_body_is_a_remote_failure() {
        let err = ConverseResponse::from_body(r#"{"error":"Template not found"}"#).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Remote);
        assert_eq!(err.message, "Template not found");

        let ok = ConverseResponse::from_body(r#"{"message":"Hi"}"#).unwrap();
        assert_eq!(ok, ConverseResponse::message("Hi"));
    }

    #[test]
    fn test_full_response_decodes() {
        let response: ConverseResponse = serde_json::from_value(json!({
            "message": "Done",
            "state": { "phase": "complete", "documentType": "nda",
                       "gatheredAnswers": { "term": "2 years" }, "currentQuestionIndex": 1 },
            "options": [{ "label": "NDA", "value": "nda" }],
            "isComplete": true,
            "generatedDocument": "DOC",
            "disclaimer": "Review with counsel"
        }))
        .unwrap();

        assert_eq!(response.state.as_ref().map(|s| s.phase), Some(Phase::Complete));
        assert_eq!(response.options.as_ref().map(Vec::len), Some(1));
        assert_eq!(response.is_complete, Some(true));
    }

    #[test]
    fn test_error_shaped_response_is_a_failure() {
        let err = ConverseResponse::failure("quota exceeded")
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind, super::super::TransportErrorKind::Remote);
        assert_eq!(err.message, "quota exceeded");
    }
}
