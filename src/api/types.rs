//! API request and response types

use crate::assistant::DocumentTemplate;
use crate::controller::SendOutcome;
use crate::session::SessionView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to open a session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub deal_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Response with a session and its current view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub deal_id: String,
    pub created_at: DateTime<Utc>,
    pub session: SessionView,
}

/// Result of a turn or an undo
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub session: SessionView,
}

impl TurnResponse {
    pub fn new(outcome: &SendOutcome, session: SessionView) -> Self {
        let error = match outcome {
            SendOutcome::Failed(message) => Some(message.clone()),
            _ => None,
        };
        Self {
            outcome: outcome.as_str(),
            error,
            session,
        }
    }
}

/// Response for go-back
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackResponse {
    pub went_back: bool,
    pub session: SessionView,
}

/// Response for the template catalog
#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<DocumentTemplate>,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
