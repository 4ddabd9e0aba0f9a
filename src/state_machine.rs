//! Document-generation conversation state machine
//!
//! The server owns every phase transition. The client adopts whatever state
//! the assistant returns, passing it through a single validation hook.

pub mod state;
pub mod validate;

#[cfg(test)]
mod proptests;

pub use state::{ConversationState, InvariantViolation, Phase};
pub use validate::{StateValidator, StrictTransitions, TransitionRejected, TrustServer};
