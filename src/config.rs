//! Startup configuration from the environment

use crate::llm::LlmConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_EDGE_FUNCTION: &str = "document-assistant";
/// Abandoned dialogs (page reloads) are dropped after this long
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Where assistant turns are answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantBackend {
    /// In-process template assistant
    Local,
    /// Remote `conversational_template` operation
    Edge {
        base_url: String,
        function: String,
        api_key: Option<String>,
    },
}

/// Where deal records come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealBackend {
    Static { file: Option<PathBuf> },
    Rest { base_url: String, api_key: Option<String> },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub assistant: AssistantBackend,
    pub deals: DealBackend,
    pub strict_transitions: bool,
    pub turn_timeout: Option<Duration>,
    pub session_idle: Duration,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("DOCGEN_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DOCGEN_PORT",
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let edge_key = var("DOCGEN_EDGE_KEY");
        let assistant = match var("DOCGEN_EDGE_URL") {
            Some(base_url) => AssistantBackend::Edge {
                base_url,
                function: var("DOCGEN_EDGE_FUNCTION")
                    .unwrap_or_else(|| DEFAULT_EDGE_FUNCTION.to_string()),
                api_key: edge_key.clone(),
            },
            None => AssistantBackend::Local,
        };

        let deals = match var("DOCGEN_REST_URL") {
            Some(base_url) => DealBackend::Rest {
                base_url,
                api_key: edge_key,
            },
            None => DealBackend::Static {
                file: var("DOCGEN_DEALS_FILE").map(PathBuf::from),
            },
        };

        let strict_transitions = match var("DOCGEN_STRICT_TRANSITIONS") {
            Some(value) => parse_flag("DOCGEN_STRICT_TRANSITIONS", value)?,
            None => false,
        };

        let turn_timeout = var("DOCGEN_TURN_TIMEOUT_SECS")
            .map(|value| parse_secs("DOCGEN_TURN_TIMEOUT_SECS", value))
            .transpose()?;
        let session_idle = match var("DOCGEN_SESSION_IDLE_SECS") {
            Some(value) => parse_secs("DOCGEN_SESSION_IDLE_SECS", value)?,
            None => DEFAULT_SESSION_IDLE,
        };

        let llm = LlmConfig {
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            gateway: var("LLM_GATEWAY"),
            model: var("DOCGEN_MODEL"),
        };

        Ok(Self {
            port,
            assistant,
            deals,
            strict_transitions,
            turn_timeout,
            session_idle,
            llm,
        })
    }
}

fn parse_secs(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "a positive number of seconds",
            value,
        }),
    }
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "a boolean",
            value,
        }),
    }
}
