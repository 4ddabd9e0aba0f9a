//! Conversation state types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Phase
// ============================================================================

/// Discrete stage of the document-generation conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// User is choosing which document template to generate
    #[default]
    SelectType,
    /// Template-specific questions are being asked one at a time
    Gathering,
    /// All answers collected, waiting for the go-ahead
    Confirming,
    /// Document is being produced (usually only visible as loading)
    Generating,
    /// Terminal: document and disclaimer are available
    Complete,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::SelectType => "select_type",
            Phase::Gathering => "gathering",
            Phase::Confirming => "confirming",
            Phase::Generating => "generating",
            Phase::Complete => "complete",
        }
    }

    /// Position in the forward progression
    pub fn rank(self) -> u8 {
        match self {
            Phase::SelectType => 0,
            Phase::Gathering => 1,
            Phase::Confirming => 2,
            Phase::Generating => 3,
            Phase::Complete => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Machine state exchanged with the assistant on every turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub document_type: Option<String>,
    /// Question key -> freeform answer
    #[serde(default)]
    pub gathered_answers: BTreeMap<String, Value>,
    #[serde(default)]
    pub current_question_index: usize,
}

/// A broken state invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Left `select_type` without choosing a document type
    MissingDocumentType { phase: Phase },
    /// Fewer answers than the cursor has moved past
    AnswersBehindCursor { answers: usize, index: usize },
    /// A question before the cursor has no answer
    UnansweredQuestion { index: usize, key: String },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::MissingDocumentType { phase } => {
                write!(f, "phase {phase} requires a document type")
            }
            InvariantViolation::AnswersBehindCursor { answers, index } => {
                write!(f, "{answers} answers recorded but question index is {index}")
            }
            InvariantViolation::UnansweredQuestion { index, key } => {
                write!(f, "question {index} ({key}) has no answer")
            }
        }
    }
}

impl ConversationState {
    /// State right after a type has been chosen
    pub fn gathering(document_type: impl Into<String>) -> Self {
        Self {
            phase: Phase::Gathering,
            document_type: Some(document_type.into()),
            gathered_answers: BTreeMap::new(),
            current_question_index: 0,
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Record an answer and move the cursor past it
    pub fn record_answer(&mut self, key: impl Into<String>, answer: Value) {
        self.gathered_answers.insert(key.into(), answer);
        self.current_question_index += 1;
    }

    /// Check the invariants that hold regardless of template.
    ///
    /// Without the template's question keys only the answer count can be
    /// compared against the cursor; see [`Self::violations_for`].
    pub fn violations(&self) -> Vec<InvariantViolation> {
        let mut found = Vec::new();
        if self.phase != Phase::SelectType && self.document_type.is_none() {
            found.push(InvariantViolation::MissingDocumentType { phase: self.phase });
        }
        if self.gathered_answers.len() < self.current_question_index {
            found.push(InvariantViolation::AnswersBehindCursor {
                answers: self.gathered_answers.len(),
                index: self.current_question_index,
            });
        }
        found
    }

    /// Check the invariants against the template's ordered question keys
    pub fn violations_for(&self, question_keys: &[&str]) -> Vec<InvariantViolation> {
        let mut found = self.violations();
        for (index, key) in question_keys
            .iter()
            .enumerate()
            .take(self.current_question_index)
        {
            if !self.gathered_answers.contains_key(*key) {
                found.push(InvariantViolation::UnansweredQuestion {
                    index,
                    key: (*key).to_string(),
                });
            }
        }
        found
    }

    pub fn is_consistent(&self) -> bool {
        self.violations().is_empty()
    }
}
