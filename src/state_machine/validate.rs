//! Validation hook for server-returned states
//!
//! The assistant is the sole authority on phase progression. Every state it
//! returns flows through one [`StateValidator`] before the session adopts
//! it, so stricter checking can be switched on without touching the
//! controller.

use super::state::{ConversationState, InvariantViolation, Phase};
use thiserror::Error;

/// A server-returned state the validator refused to adopt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionRejected {
    #[error("Illegal phase transition: {from} -> {to}")]
    IllegalPhase { from: Phase, to: Phase },
    #[error("Inconsistent state: {0}")]
    Inconsistent(InvariantViolation),
}

pub trait StateValidator: Send + Sync {
    /// Decide whether `next` may replace `previous`
    fn validate(
        &self,
        previous: &ConversationState,
        next: &ConversationState,
    ) -> Result<(), TransitionRejected>;
}

/// Adopts whatever the server returns
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustServer;

impl StateValidator for TrustServer {
    fn validate(
        &self,
        _previous: &ConversationState,
        _next: &ConversationState,
    ) -> Result<(), TransitionRejected> {
        Ok(())
    }
}

/// Rejects inconsistent states and impossible phase moves.
///
/// Allowed: staying in a phase, moving forward, `confirming -> gathering`
/// (revising an answer) and any non-terminal phase back to `select_type`
/// (restart). Nothing leaves `complete` except `reset`, which never goes
/// through the validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictTransitions;

impl StrictTransitions {
    fn phase_allowed(from: Phase, to: Phase) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (Phase::Complete, _) => false,
            (Phase::Confirming | Phase::Generating, Phase::Gathering) => from == Phase::Confirming,
            (_, Phase::SelectType) => true,
            _ => to.rank() > from.rank(),
        }
    }
}

impl StateValidator for StrictTransitions {
    fn validate(
        &self,
        previous: &ConversationState,
        next: &ConversationState,
    ) -> Result<(), TransitionRejected> {
        if !Self::phase_allowed(previous.phase, next.phase) {
            return Err(TransitionRejected::IllegalPhase {
                from: previous.phase,
                to: next.phase,
            });
        }
        match next.violations().into_iter().next() {
            Some(violation) => Err(TransitionRejected::Inconsistent(violation)),
            None => Ok(()),
        }
    }
}
