//! Turning gathered answers into document text

use super::templates::DocumentTemplate;
use super::AssistantError;
use crate::deal::DealContext;
use crate::llm::{LlmRequest, LlmService};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// Attached to every generated document
pub const DISCLAIMER: &str = "This document was generated automatically from your answers and \
is provided for information only. It is not legal advice. Have it reviewed by a qualified \
lawyer before signing or sending it to a counterparty.";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // literal pattern
    Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("placeholder pattern is valid")
});

#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(
        &self,
        template: &DocumentTemplate,
        answers: &BTreeMap<String, Value>,
        deal: Option<&DealContext>,
    ) -> Result<String, AssistantError>;

    fn name(&self) -> &str;
}

/// Answer text as it should appear in a document
pub fn answer_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Fill `{{slot}}` placeholders from answers, then deal fields, then `date`.
/// Unknown slots render as `[slot]` so gaps are visible in the draft.
pub fn render(
    body: &str,
    answers: &BTreeMap<String, Value>,
    deal: Option<&DealContext>,
    date: NaiveDate,
) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &Captures<'_>| {
            let key = &caps[1];
            answers
                .get(key)
                .map(answer_text)
                .filter(|s| !s.trim().is_empty())
                .or_else(|| deal.and_then(|d| d.field(key)))
                .or_else(|| (key == "date").then(|| date.format("%-d %B %Y").to_string()))
                .unwrap_or_else(|| format!("[{key}]"))
        })
        .into_owned()
}

/// Plain placeholder substitution
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDrafter;

#[async_trait]
impl Drafter for TemplateDrafter {
    async fn draft(
        &self,
        template: &DocumentTemplate,
        answers: &BTreeMap<String, Value>,
        deal: Option<&DealContext>,
    ) -> Result<String, AssistantError> {
        Ok(render(template.body, answers, deal, Utc::now().date_naive()))
    }

    fn name(&self) -> &str {
        "template"
    }
}

const POLISH_SYSTEM: &str = "You are a careful M&A paralegal. Improve the wording of the draft \
you are given without changing any party, amount, date or term. Keep bracketed gaps as they are. \
Output only the document.";

/// Renders the template, then asks an LLM to tidy the wording
pub struct LlmDrafter {
    llm: Arc<dyn LlmService>,
}

impl LlmDrafter {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Drafter for LlmDrafter {
    async fn draft(
        &self,
        template: &DocumentTemplate,
        answers: &BTreeMap<String, Value>,
        deal: Option<&DealContext>,
    ) -> Result<String, AssistantError> {
        let base = render(template.body, answers, deal, Utc::now().date_naive());
        let request = LlmRequest::prompt(
            Some(POLISH_SYSTEM.to_string()),
            format!("Document type: {}\n\n{base}", template.name),
        );

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| AssistantError::Drafting(e.message))?;

        let text = response.text.trim();
        if text.is_empty() {
            tracing::warn!(template = template.id, "LLM returned an empty draft, using template text");
            return Ok(base);
        }
        if !response.end_turn {
            tracing::warn!(
                template = template.id,
                output_tokens = response.usage.output_tokens,
                "LLM draft hit the token limit, using template text"
            );
            return Ok(base);
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "llm"
    }
}
