//! Request and response shapes for single-shot drafting prompts

/// One system-plus-user prompt
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub prompt: String,
}

impl LlmRequest {
    pub fn prompt(system: Option<String>, prompt: impl Into<String>) -> Self {
        Self {
            system,
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Concatenated text blocks
    pub text: String,
    /// False when the model stopped on the token limit
    pub end_turn: bool,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
