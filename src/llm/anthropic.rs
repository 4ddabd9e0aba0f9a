//! Anthropic Messages API client for document polishing

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
/// Long enough for a full agreement
const DRAFT_MAX_TOKENS: u32 = 4096;
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicService {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicService {
    pub fn new(api_key: String, model: Option<String>, gateway: Option<&str>) -> Result<Self, LlmError> {
        let endpoint = match gateway {
            Some(gw) => format!("{}/_/gateway/anthropic/v1/messages", gw.trim_end_matches('/')),
            None => "https://api.anthropic.com/v1/messages".to_string(),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint,
        })
    }

    fn body<'a>(&'a self, request: &'a LlmRequest) -> MessagesBody<'a> {
        MessagesBody {
            model: &self.model,
            max_tokens: DRAFT_MAX_TOKENS,
            system: request.system.as_deref(),
            messages: [UserTurn {
                role: "user",
                content: &request.prompt,
            }],
        }
    }
}

impl From<MessagesReply> for LlmResponse {
    fn from(reply: MessagesReply) -> Self {
        let text = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                ReplyBlock::Text { text } => Some(text),
                ReplyBlock::Other => None,
            })
            .collect::<String>();

        LlmResponse {
            text,
            end_turn: reply.stop_reason.as_deref() != Some("max_tokens"),
            usage: Usage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| LlmError::network(format!("Drafting request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read drafting reply: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let reply: MessagesReply = serde_json::from_str(&text)
            .map_err(|e| LlmError::decode(format!("Malformed drafting reply: {e}")))?;
        Ok(reply.into())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [UserTurn<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplyBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ReplyBlock>,
    stop_reason: Option<String>,
    usage: ReplyUsage,
}

#[derive(Debug, Deserialize)]
struct ReplyUsage {
    input_tokens: u64,
    output_tokens: u64,
}
