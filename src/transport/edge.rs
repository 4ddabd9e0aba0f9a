//! Remote assistant hosted as a backend edge function

use super::{ConverseRequest, ConverseResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Calls `{base}/functions/v1/{function}` with the turn as a JSON body
pub struct EdgeFunctionTransport {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl EdgeFunctionTransport {
    pub fn new(
        base_url: &str,
        function: &str,
        api_key: Option<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!(
                "{}/functions/v1/{}",
                base_url.trim_end_matches('/'),
                function.trim_matches('/')
            ),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> TransportError {
        // Functions usually answer `{ "error": "..." }` on failure
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.to_string());
        TransportError::status(status.as_u16(), format!("HTTP {status}: {message}"))
    }
}

#[async_trait]
impl Transport for EdgeFunctionTransport {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, TransportError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                TransportError::network(format!("Connection failed: {e}"))
            } else {
                TransportError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        ConverseResponse::from_body(&body)
    }

    fn name(&self) -> &str {
        "edge_function"
    }
}
