//! Property-based tests for the conversation state machine
//!
//! These tests verify the session's undo laws and the assistant's phase
//! invariants hold across arbitrary turn sequences.

use super::state::*;
use crate::assistant::{TemplateAssistant, TemplateCatalog, TemplateDrafter};
use crate::session::{ConversationSession, QuickOption};
use crate::transport::{ConverseRequest, ConverseResponse};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_phase() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::SelectType),
        Just(Phase::Gathering),
        Just(Phase::Confirming),
        Just(Phase::Generating),
        Just(Phase::Complete),
    ]
}

fn arb_state() -> impl Strategy<Value = ConversationState> {
    (
        arb_phase(),
        proptest::option::of("[a-z]{2,12}"),
        proptest::collection::vec("[a-z ]{1,10}", 0..4),
    )
        .prop_map(|(phase, document_type, answers)| {
            let mut state = ConversationState {
                phase,
                document_type,
                ..ConversationState::default()
            };
            for (i, answer) in answers.into_iter().enumerate() {
                state.record_answer(format!("q{i}"), json!(answer));
            }
            state
        })
}

fn arb_option() -> impl Strategy<Value = QuickOption> {
    ("[A-Za-z ]{1,12}", "[a-z]{1,8}").prop_map(|(label, value)| QuickOption::new(label, value))
}

/// Reply that never completes the conversation
fn arb_reply() -> impl Strategy<Value = ConverseResponse> {
    (
        "[a-zA-Z ?]{1,30}",
        proptest::option::of(arb_state()),
        proptest::option::of(proptest::collection::vec(arb_option(), 0..4)),
    )
        .prop_map(|(message, state, options)| ConverseResponse {
            message,
            state,
            options,
            ..ConverseResponse::default()
        })
}

#[derive(Debug, Clone)]
enum Op {
    Send(String, Result<ConverseResponse, String>),
    GoBack,
    Reset,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => ("[a-z ]{1,12}", arb_reply()).prop_map(|(text, reply)| Op::Send(text, Ok(reply))),
        2 => ("[a-z ]{1,12}", "[a-z ]{1,20}").prop_map(|(text, err)| Op::Send(text, Err(err))),
        2 => Just(Op::GoBack),
        1 => Just(Op::Reset),
    ]
}

/// What a user might type at any point in the dialog
fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("start".to_string()),
        Just("nda".to_string()),
        Just("loi".to_string()),
        Just("Exclusivity Agreement".to_string()),
        Just("yes".to_string()),
        Just("no".to_string()),
        Just("generate".to_string()),
        Just("restart".to_string()),
        "[A-Za-z ]{1,15}",
    ]
}

// ============================================================================
// Test Helpers
// ============================================================================

fn apply(session: &mut ConversationSession, op: Op) {
    match op {
        Op::Send(text, outcome) => {
            let pending = session.apply_optimistic(text);
            match outcome {
                Ok(reply) => assert!(session.commit(pending, reply)),
                Err(error) => session.compensate(pending, error),
            }
        }
        Op::GoBack => {
            session.go_back();
        }
        Op::Reset => session.reset(),
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Undo law: n committed turns then n go-backs replay the snapshots in reverse
    #[test]
    fn prop_history_is_lifo(
        turns in proptest::collection::vec(("[a-z ]{1,12}", arb_reply()), 1..10)
    ) {
        let mut session = ConversationSession::new();
        let mut before = Vec::new();

        for (text, reply) in turns {
            before.push((session.messages.clone(), session.state.clone(), session.options.clone()));
            let pending = session.apply_optimistic(text);
            prop_assert!(session.commit(pending, reply));
        }
        prop_assert_eq!(session.history.len(), before.len());

        while let Some(expected) = before.pop() {
            prop_assert!(session.go_back());
            prop_assert_eq!(
                (session.messages.clone(), session.state.clone(), session.options.clone()),
                expected
            );
        }
        prop_assert!(!session.go_back());
    }

    // A failed turn never changes history depth
    #[test]
    fn prop_failure_restores_history_depth(
        ops in proptest::collection::vec(arb_op(), 0..15),
        text in "[a-z]{1,10}",
        error in "[a-z ]{1,20}",
    ) {
        let mut session = ConversationSession::new();
        for op in ops {
            apply(&mut session, op);
        }
        let depth = session.history.len();
        let transcript = session.messages.len();

        apply(&mut session, Op::Send(text.clone(), Err(error.clone())));

        prop_assert_eq!(session.history.len(), depth);
        prop_assert_eq!(session.messages.len(), transcript + 1);
        prop_assert_eq!(session.messages.last().map(|m| m.content.as_str()), Some(text.as_str()));
        prop_assert_eq!(session.error.as_deref(), Some(error.as_str()));
        prop_assert!(!session.is_loading);
    }

    // Reset reaches the empty session and stays there
    #[test]
    fn prop_reset_is_idempotent(ops in proptest::collection::vec(arb_op(), 0..15)) {
        let mut session = ConversationSession::new();
        for op in ops {
            apply(&mut session, op);
        }

        session.reset();
        let once = session.view();
        session.reset();

        prop_assert_eq!(&once, &session.view());
        prop_assert_eq!(once, ConversationSession::new().view());
    }

    // Each operation moves history by at most one entry; reset clears it
    #[test]
    fn prop_history_moves_one_step(ops in proptest::collection::vec(arb_op(), 0..25)) {
        let mut session = ConversationSession::new();
        for op in ops {
            let depth = session.history.len();
            let expected = match &op {
                Op::Send(_, Ok(_)) => depth + 1,
                Op::Send(_, Err(_)) => depth,
                Op::GoBack => depth.saturating_sub(1),
                Op::Reset => 0,
            };
            apply(&mut session, op);
            prop_assert_eq!(session.history.len(), expected);
            prop_assert_eq!(
                session.can_go_back(),
                !session.history.is_empty() && !session.is_loading && !session.is_complete
            );
        }
    }

    // Optimistic apply always snapshots the pre-send transcript
    #[test]
    fn prop_snapshot_excludes_pending_message(
        ops in proptest::collection::vec(arb_op(), 0..10),
        text in "[a-z]{1,10}",
    ) {
        let mut session = ConversationSession::new();
        for op in ops {
            apply(&mut session, op);
        }
        let before = session.messages.clone();

        let pending = session.apply_optimistic(text);
        prop_assert!(session.is_loading);
        prop_assert!(!session.can_go_back());
        prop_assert!(session.is_current(&pending));

        session.go_back();
        prop_assert_eq!(session.messages.clone(), before);
        prop_assert!(!session.is_current(&pending));
    }

    // Every state the assistant hands back satisfies the phase invariants,
    // and answers only accumulate while a document type is held
    #[test]
    fn prop_assistant_states_are_consistent(
        inputs in proptest::collection::vec(arb_input(), 1..20)
    ) {
        let assistant = TemplateAssistant::new(TemplateCatalog::builtin(), Arc::new(TemplateDrafter));
        let mut session = ConversationSession::new();

        for input in inputs {
            let previous = session.state.clone();
            let pending = session.apply_optimistic(input);
            let request = ConverseRequest::new(
                "deal-1",
                "user-1",
                session.messages.clone(),
                session.state.clone(),
                None,
            );
            let reply = block_on(assistant.respond(&request)).unwrap();
            let next = reply.state.clone().unwrap();
            prop_assert!(session.commit(pending, reply));

            prop_assert!(next.is_consistent(), "Inconsistent state: {:?}", next);
            if let Some(doc) = next.document_type.as_deref() {
                let template = assistant.catalog().get(doc).unwrap();
                prop_assert!(next.violations_for(&template.question_keys()).is_empty());
                prop_assert!(next.current_question_index <= template.questions.len());
            } else {
                prop_assert_eq!(next.phase, Phase::SelectType);
            }

            if previous.document_type.is_some() && previous.document_type == next.document_type {
                prop_assert!(next.gathered_answers.len() >= previous.gathered_answers.len());
                prop_assert!(next.phase.rank() >= previous.phase.rank());
            }
        }
    }
}
