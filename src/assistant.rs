//! Server side of the `conversational_template` operation
//!
//! Drives the phase progression over the template catalog: pick a type,
//! answer its questions one at a time, confirm, generate.

mod drafter;
mod templates;

pub use drafter::{render, Drafter, LlmDrafter, TemplateDrafter, DISCLAIMER};
pub use templates::{DocumentTemplate, Question, TemplateCatalog};

use crate::deal::DealContext;
use crate::session::QuickOption;
use crate::state_machine::{ConversationState, Phase};
use crate::transport::{ConverseRequest, ConverseResponse, CONVERSATIONAL_TEMPLATE};
use drafter::answer_text;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Unknown document type: {0}")]
    UnknownTemplate(String),
    #[error("Document drafting failed: {0}")]
    Drafting(String),
}

const GENERATE: &str = "generate";
const RESTART: &str = "restart";

/// Lowercased words with punctuation stripped
fn words(input: &str) -> Vec<String> {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// "Yes, generate it" and "ok." count; only the first word decides
fn is_affirmative(input: &str) -> bool {
    words(input).first().is_some_and(|first| {
        matches!(
            first.as_str(),
            "generate" | "yes" | "y" | "yep" | "sure" | "ok" | "okay" | "confirm" | "proceed" | "go"
        )
    })
}

fn is_restart(input: &str) -> bool {
    matches!(words(input).join(" ").as_str(), "restart" | "start over")
}

pub struct TemplateAssistant {
    catalog: TemplateCatalog,
    drafter: Arc<dyn Drafter>,
}

impl TemplateAssistant {
    pub fn new(catalog: TemplateCatalog, drafter: Arc<dyn Drafter>) -> Self {
        Self { catalog, drafter }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Produce the next assistant turn
    pub async fn respond(&self, request: &ConverseRequest) -> Result<ConverseResponse, AssistantError> {
        if request.operation != CONVERSATIONAL_TEMPLATE {
            return Err(AssistantError::UnsupportedOperation(request.operation.clone()));
        }

        let input = request.last_user_message().unwrap_or_default().trim();
        let state = &request.conversational_state;
        let deal = request.deal_context();

        tracing::debug!(phase = %state.phase, document_type = ?state.document_type, "Assistant turn");

        match state.phase {
            Phase::SelectType => Ok(self.select_type(input, deal)),
            Phase::Gathering => {
                let template = self.template_for(state)?;
                Ok(Self::gather(template, state, input, deal))
            }
            Phase::Confirming | Phase::Generating => {
                let template = self.template_for(state)?;
                self.confirm(template, state, input, deal).await
            }
            Phase::Complete => {
                let template = self.template_for(state)?;
                Ok(ConverseResponse::message(format!(
                    "Your {} is complete. Reset the conversation to prepare another document.",
                    template.name
                ))
                .with_state(state.clone()))
            }
        }
    }

    fn template_for(&self, state: &ConversationState) -> Result<&DocumentTemplate, AssistantError> {
        let id = state.document_type.as_deref().unwrap_or_default();
        self.catalog
            .get(id)
            .ok_or_else(|| AssistantError::UnknownTemplate(id.to_string()))
    }

    fn catalog_options(&self) -> Vec<QuickOption> {
        self.catalog
            .templates()
            .iter()
            .map(|t| QuickOption::new(t.name, t.id).with_description(t.description))
            .collect()
    }

    fn select_type(&self, input: &str, deal: Option<&DealContext>) -> ConverseResponse {
        if let Some(template) = self.catalog.find(input) {
            return Self::begin(template, deal);
        }

        let mut message = String::new();
        if !input.is_empty() && !input.eq_ignore_ascii_case("start") {
            let _ = write!(message, "I don't have a template called \"{input}\". ");
        }
        match deal.and_then(|d| d.field("title")) {
            Some(title) => {
                let _ = write!(message, "Which document would you like to prepare for {title}?");
            }
            None => message.push_str("Which document would you like to prepare?"),
        }

        ConverseResponse::message(message)
            .with_state(ConversationState::default())
            .with_options(self.catalog_options())
    }

    fn begin(template: &DocumentTemplate, deal: Option<&DealContext>) -> ConverseResponse {
        let state = ConversationState::gathering(template.id);
        match template.questions.first() {
            Some(question) => ConverseResponse::message(format!(
                "Let's prepare a {}. {}",
                template.name, question.prompt
            ))
            .with_state(state)
            .with_options(question_options(question, deal)),
            None => Self::recap(template, state.with_phase(Phase::Confirming)),
        }
    }

    fn gather(
        template: &DocumentTemplate,
        state: &ConversationState,
        input: &str,
        deal: Option<&DealContext>,
    ) -> ConverseResponse {
        let Some(question) = template.questions.get(state.current_question_index) else {
            return Self::recap(template, state.clone().with_phase(Phase::Confirming));
        };

        if input.is_empty() {
            return ConverseResponse::message(question.prompt)
                .with_state(state.clone())
                .with_options(question_options(question, deal));
        }

        let mut next = state.clone();
        next.record_answer(question.key, Value::String(input.to_string()));

        match template.questions.get(next.current_question_index) {
            Some(following) => ConverseResponse::message(format!("Thanks. {}", following.prompt))
                .with_state(next)
                .with_options(question_options(following, deal)),
            None => Self::recap(template, next.with_phase(Phase::Confirming)),
        }
    }

    fn recap(template: &DocumentTemplate, state: ConversationState) -> ConverseResponse {
        let mut message = format!("Here's what I have for your {}:\n", template.name);
        for question in &template.questions {
            let answer = state
                .gathered_answers
                .get(question.key)
                .map(answer_text)
                .unwrap_or_default();
            let _ = writeln!(message, "- {}: {answer}", question.label);
        }
        message.push_str("Shall I generate the document?");

        ConverseResponse::message(message)
            .with_state(state)
            .with_options(confirm_options())
    }

    async fn confirm(
        &self,
        template: &DocumentTemplate,
        state: &ConversationState,
        input: &str,
        deal: Option<&DealContext>,
    ) -> Result<ConverseResponse, AssistantError> {
        if is_restart(input) {
            return Ok(self.select_type("start", deal));
        }
        if !is_affirmative(input) {
            return Ok(ConverseResponse::message(format!(
                "Reply \"{GENERATE}\" when you're ready, or \"{RESTART}\" to choose a different document."
            ))
            .with_state(state.clone().with_phase(Phase::Confirming))
            .with_options(confirm_options()));
        }

        let document = self
            .drafter
            .draft(template, &state.gathered_answers, deal)
            .await?;
        tracing::info!(
            template = template.id,
            drafter = self.drafter.name(),
            chars = document.len(),
            "Document generated"
        );

        Ok(ConverseResponse::message(format!(
            "Your {} is ready. Review it carefully before sharing.",
            template.name
        ))
        .with_state(state.clone().with_phase(Phase::Complete))
        .with_options(Vec::new())
        .completed(document, DISCLAIMER))
    }
}

fn question_options(question: &Question, deal: Option<&DealContext>) -> Vec<QuickOption> {
    let mut options = Vec::new();
    if let Some(value) = question
        .deal_field
        .and_then(|field| deal.and_then(|d| d.field(field)))
    {
        options.push(
            QuickOption::new(format!("Use {value}"), value).with_description("From the deal record"),
        );
    }
    options.extend(
        question
            .suggestions
            .iter()
            .map(|s| QuickOption::new(*s, *s)),
    );
    options
}

fn confirm_options() -> Vec<QuickOption> {
    vec![
        QuickOption::new("Generate document", GENERATE),
        QuickOption::new("Start over", RESTART),
    ]
}
