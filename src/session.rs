//! Conversation session: transcript, quick options and the undo history
//!
//! All mutation of a session goes through the turn lifecycle below:
//! [`ConversationSession::apply_optimistic`] before the transport call, then
//! exactly one of [`ConversationSession::commit`] or
//! [`ConversationSession::compensate`] when it settles.

use crate::state_machine::ConversationState;
use crate::transport::ConverseResponse;
use serde::{Deserialize, Serialize};

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Server-suggested shortcut reply; selecting it is the same as typing `value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QuickOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// History
// ============================================================================

/// Snapshot taken immediately before a user turn is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub messages: Vec<ConversationMessage>,
    pub state: ConversationState,
    pub options: Vec<QuickOption>,
}

/// Strict LIFO stack of pre-send snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Session
// ============================================================================

/// Ticket for a turn that has been applied optimistically but not settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub generation: u64,
    /// History depth right after this turn's snapshot was pushed
    depth: usize,
}

/// The aggregate owned by one document-generation dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSession {
    pub messages: Vec<ConversationMessage>,
    pub state: ConversationState,
    pub options: Vec<QuickOption>,
    pub history: History,
    pub generated_document: Option<String>,
    pub disclaimer: Option<String>,
    pub is_complete: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Bumped whenever the session is rewound, so late responses can be dropped
    pub generation: u64,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            messages: self.messages.clone(),
            state: self.state.clone(),
            options: self.options.clone(),
        }
    }

    /// True iff there is something to undo and nothing in flight or finished
    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty() && !self.is_loading && !self.is_complete
    }

    /// Snapshot, append the user message and mark the turn in flight
    pub fn apply_optimistic(&mut self, content: impl Into<String>) -> PendingTurn {
        self.history.push(self.snapshot());
        self.messages.push(ConversationMessage::user(content));
        self.is_loading = true;
        self.error = None;
        PendingTurn {
            generation: self.generation,
            depth: self.history.len(),
        }
    }

    /// Whether a response for `pending` may still be applied
    pub fn is_current(&self, pending: &PendingTurn) -> bool {
        self.generation == pending.generation
    }

    /// Apply the assistant's reply for a pending turn.
    ///
    /// Returns false, leaving the session untouched, when the ticket no
    /// longer matches the top of the history stack.
    pub fn commit(&mut self, pending: PendingTurn, response: ConverseResponse) -> bool {
        if !self.is_current(&pending) || self.history.len() != pending.depth {
            return false;
        }
        let ConverseResponse {
            message,
            state,
            options,
            is_complete,
            generated_document,
            disclaimer,
            ..
        } = response;

        self.messages.push(ConversationMessage::assistant(message));
        if let Some(state) = state {
            self.state = state;
        }
        self.options = options.unwrap_or_default();
        if is_complete.unwrap_or(false) {
            self.is_complete = true;
            self.generated_document = generated_document.or(self.generated_document.take());
            self.disclaimer = disclaimer.or(self.disclaimer.take());
        }
        self.is_loading = false;
        true
    }

    /// Undo the bookkeeping of a failed turn.
    ///
    /// Pops exactly the snapshot this turn pushed; the optimistic user
    /// message stays in the transcript.
    pub fn compensate(&mut self, pending: PendingTurn, error: impl Into<String>) {
        if self.history.len() == pending.depth {
            self.history.pop();
        }
        self.error = Some(error.into());
        self.is_loading = false;
    }

    /// Pop one snapshot and restore it. Returns false when there was nothing to undo.
    pub fn go_back(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        self.messages = entry.messages;
        self.state = entry.state;
        self.options = entry.options;
        self.is_loading = false;
        self.error = None;
        // Outputs only exist for the turn that was just undone
        self.is_complete = false;
        self.generated_document = None;
        self.disclaimer = None;
        self.generation += 1;
        true
    }

    /// Back to the empty session; any in-flight response becomes stale
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            messages: self.messages.clone(),
            state: self.state.clone(),
            options: self.options.clone(),
            history_depth: self.history.len(),
            can_go_back: self.can_go_back(),
            is_loading: self.is_loading,
            is_complete: self.is_complete,
            error: self.error.clone(),
            generated_document: self.generated_document.clone(),
            disclaimer: self.disclaimer.clone(),
        }
    }
}

/// Read-only rendering of a session for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub messages: Vec<ConversationMessage>,
    pub state: ConversationState,
    pub options: Vec<QuickOption>,
    pub history_depth: usize,
    pub can_go_back: bool,
    pub is_loading: bool,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}
