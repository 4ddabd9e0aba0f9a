//! Conversation controller
//!
//! Orchestrates one document-generation dialog: optimistic send, transport
//! call, commit or compensate, plus single-step undo and reset.
//!
//! Sends are single-flight. A send issued while another is in flight is
//! refused with [`SendOutcome::Busy`], and any rewind (`reset`, `go_back`,
//! `start_conversation`) invalidates the in-flight turn so its response is
//! dropped on arrival.

mod notifier;

#[cfg(test)]
pub mod testing;

pub use notifier::{BroadcastNotifier, Notice, NoticeLevel, Notifier, SessionEvent, TracingNotifier};

use crate::deal::DealSource;
use crate::session::{ConversationSession, PendingTurn, QuickOption, SessionView};
use crate::state_machine::{StateValidator, TrustServer};
use crate::transport::{ConverseRequest, ConverseResponse, Transport, TransportError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Synthetic first user turn sent by [`ConversationController::start_conversation`]
pub const START_MESSAGE: &str = "start";

/// Who is talking and about which deal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// `None` when nobody is signed in; sends are ignored
    pub user_id: Option<String>,
    pub deal_id: String,
}

impl SessionContext {
    pub fn new(user_id: Option<String>, deal_id: impl Into<String>) -> Self {
        Self {
            user_id,
            deal_id: deal_id.into(),
        }
    }
}

/// How a send settled. Failures are also recorded on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input or no signed-in user
    Ignored,
    /// Another send is still in flight
    Busy,
    /// Assistant reply committed
    Applied,
    /// Turn failed and was compensated
    Failed(String),
    /// Session was rewound while the request was in flight
    Superseded,
}

impl SendOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendOutcome::Ignored => "ignored",
            SendOutcome::Busy => "busy",
            SendOutcome::Applied => "applied",
            SendOutcome::Failed(_) => "failed",
            SendOutcome::Superseded => "superseded",
        }
    }
}

pub struct ConversationController<T, D>
where
    T: Transport,
    D: DealSource,
{
    context: SessionContext,
    transport: T,
    deals: D,
    validator: Arc<dyn StateValidator>,
    notifier: Arc<dyn Notifier>,
    turn_timeout: Option<Duration>,
    session: Mutex<ConversationSession>,
}

impl<T, D> ConversationController<T, D>
where
    T: Transport,
    D: DealSource,
{
    pub fn new(context: SessionContext, transport: T, deals: D) -> Self {
        Self {
            context,
            transport,
            deals,
            validator: Arc::new(TrustServer),
            notifier: Arc::new(TracingNotifier),
            turn_timeout: None,
            session: Mutex::new(ConversationSession::new()),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn StateValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    // The lock is never held across an await, so a poisoned guard still
    // holds a coherent session.
    fn lock(&self) -> MutexGuard<'_, ConversationSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view(&self) -> SessionView {
        self.lock().view()
    }

    pub fn can_go_back(&self) -> bool {
        self.lock().can_go_back()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    // Called with the guard still held so subscribers see updates in order
    fn publish(&self, session: &ConversationSession) {
        self.notifier.session_updated(&session.view());
    }

    /// Wipe the session and open a fresh conversation
    pub async fn start_conversation(&self) -> SendOutcome {
        tracing::info!(deal_id = %self.context.deal_id, "Starting document conversation");
        self.reset();
        self.send_message(START_MESSAGE).await
    }

    /// Equivalent to typing the option's value
    pub async fn select_option(&self, option: &QuickOption) -> SendOutcome {
        self.send_message(&option.value).await
    }

    pub async fn send_message(&self, content: &str) -> SendOutcome {
        let text = content.trim();
        let Some(user_id) = self.context.user_id.as_deref() else {
            tracing::debug!(deal_id = %self.context.deal_id, "Ignoring message: no signed-in user");
            return SendOutcome::Ignored;
        };
        if text.is_empty() {
            tracing::debug!(deal_id = %self.context.deal_id, "Ignoring blank message");
            return SendOutcome::Ignored;
        }

        let (pending, messages, state) = {
            let mut session = self.lock();
            if session.is_loading {
                tracing::warn!(deal_id = %self.context.deal_id, "Send refused: a turn is already in flight");
                return SendOutcome::Busy;
            }
            let pending = session.apply_optimistic(text);
            self.publish(&session);
            (pending, session.messages.clone(), session.state.clone())
        };

        // Deal fields are fetched fresh for every turn
        let deal_context = match self.deals.fetch(&self.context.deal_id).await {
            Ok(deal) => Some(deal),
            Err(e) => {
                tracing::warn!(deal_id = %self.context.deal_id, error = %e, "Sending turn without deal context");
                None
            }
        };

        let request = ConverseRequest::new(
            self.context.deal_id.clone(),
            user_id,
            messages,
            state,
            deal_context,
        );
        let result = self.call_transport(&request).await;
        self.settle(pending, result)
    }

    async fn call_transport(
        &self,
        request: &ConverseRequest,
    ) -> Result<ConverseResponse, TransportError> {
        let call = self.transport.converse(request);
        let response = match self.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                TransportError::timeout(format!("No response within {}s", limit.as_secs()))
            })??,
            None => call.await?,
        };
        response.into_result()
    }

    /// Commit or compensate a pending turn, unless the session moved on
    fn settle(
        &self,
        pending: PendingTurn,
        result: Result<ConverseResponse, TransportError>,
    ) -> SendOutcome {
        let mut session = self.lock();
        if !session.is_current(&pending) {
            tracing::debug!(deal_id = %self.context.deal_id, "Dropping response for a rewound session");
            return SendOutcome::Superseded;
        }

        let validated = result.and_then(|response| {
            if let Some(next) = &response.state {
                self.validator
                    .validate(&session.state, next)
                    .map_err(|e| TransportError::rejected(e.to_string()))?;
            }
            Ok(response)
        });

        let outcome = match validated {
            Ok(response) => {
                if !session.commit(pending, response) {
                    tracing::debug!(deal_id = %self.context.deal_id, "Dropping response for a stale turn");
                    return SendOutcome::Superseded;
                }
                tracing::debug!(
                    deal_id = %self.context.deal_id,
                    phase = %session.state.phase,
                    history = session.history.len(),
                    is_complete = session.is_complete,
                    "Turn applied"
                );
                SendOutcome::Applied
            }
            Err(e) => {
                session.compensate(pending, e.message.clone());
                self.notifier
                    .notify(&Notice::error("Failed to process message", e.message.clone()));
                SendOutcome::Failed(e.message)
            }
        };

        self.publish(&session);
        outcome
    }

    /// Undo the most recent user turn. Returns false when there was nothing to undo.
    pub fn go_back(&self) -> bool {
        let mut session = self.lock();
        let changed = session.go_back();
        if changed {
            self.publish(&session);
        }
        changed
    }

    pub fn reset(&self) {
        let mut session = self.lock();
        session.reset();
        self.publish(&session);
    }
}
