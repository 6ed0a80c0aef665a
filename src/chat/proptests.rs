//! Property-based tests for turn commit semantics
//!
//! Random sequences of scripted backend behaviour must never leave committed
//! history in a partial or poisoned state.

use super::session::{ChatSession, TurnOutcome};
use super::testing::{MockModel, MockToolServer};
use crate::llm::{Candidate, LlmError, LlmResponse, Message, Part, Role, Usage};
use proptest::prelude::*;
use serde_json::{json, Map};

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// What the backend does during one turn
#[derive(Debug, Clone)]
enum Script {
    Text(String),
    Empty,
    Absent,
    Error,
    ToolThen(Box<Script>),
}

fn arb_terminal() -> impl Strategy<Value = Script> {
    prop_oneof![
        4 => "[a-zA-Z ]{1,20}".prop_map(Script::Text),
        1 => Just(Script::Empty),
        1 => Just(Script::Absent),
        1 => Just(Script::Error),
    ]
}

fn arb_script() -> impl Strategy<Value = Script> {
    prop_oneof![
        3 => arb_terminal(),
        2 => arb_terminal().prop_map(|s| Script::ToolThen(Box::new(s))),
    ]
}

fn tool_call() -> LlmResponse {
    let mut args = Map::new();
    args.insert("topic".to_string(), json!("Q3"));
    LlmResponse::from_message(Message::new(
        Role::Model,
        vec![Part::function_call("schedule_meeting", args)],
    ))
}

fn queue(model: &MockModel, script: &Script) {
    match script {
        Script::Text(text) => model.queue_response(LlmResponse::from_message(Message::model_text(text))),
        Script::Empty => model.queue_response(LlmResponse {
            candidates: vec![Candidate {
                content: Some(Message::new(Role::Model, vec![])),
                finish_reason: Some("SAFETY".to_string()),
            }],
            usage: Usage::default(),
        }),
        Script::Absent => model.queue_none(),
        Script::Error => model.queue_error(LlmError::invalid_request("rejected")),
        Script::ToolThen(next) => {
            model.queue_response(tool_call());
            queue(model, next);
        }
    }
}

fn is_abandoning(script: &Script) -> bool {
    match script {
        Script::Absent | Script::Error => true,
        Script::Text(_) | Script::Empty => false,
        Script::ToolThen(next) => is_abandoning(next),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_history_only_changes_on_commit(scripts in proptest::collection::vec(arb_script(), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let model = MockModel::new();
        let server = MockToolServer::new()
            .with_tool_output("schedule_meeting", "Successfully scheduled new meeting: 'Q3'");
        let mut session = ChatSession::new(&model, &server);

        for (i, script) in scripts.iter().enumerate() {
            queue(&model, script);
            let before = session.history().to_vec();
            let outcome = runtime.block_on(session.run_turn(&format!("message {i}")));

            match outcome {
                TurnOutcome::Abandoned(_) => {
                    prop_assert!(is_abandoning(script));
                    prop_assert_eq!(session.history(), before.as_slice());
                }
                TurnOutcome::Committed { .. } => {
                    prop_assert!(!is_abandoning(script));
                    prop_assert!(session.history().len() > before.len());
                    prop_assert_eq!(&session.history()[..before.len()], before.as_slice());
                    prop_assert_eq!(
                        &session.history()[before.len()],
                        &Message::user_text(format!("message {i}"))
                    );
                }
                TurnOutcome::Exit => prop_assert!(false, "unexpected exit"),
            }

            for message in session.history() {
                prop_assert!(!message.parts.is_empty(), "empty message committed");
            }
        }
    }

    #[test]
    fn prop_tool_batches_are_single_messages(scripts in proptest::collection::vec(arb_script(), 1..8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let model = MockModel::new();
        let server = MockToolServer::new().with_transport_failure("schedule_meeting");
        let mut session = ChatSession::new(&model, &server);

        for (i, script) in scripts.iter().enumerate() {
            queue(&model, script);
            runtime.block_on(session.run_turn(&format!("turn {i}")));
        }

        // Every tool message directly follows the model message that asked for it
        let history = session.history();
        for (i, message) in history.iter().enumerate() {
            if message.role == Role::Tool {
                prop_assert!(i > 0);
                let calls = history[i - 1]
                    .parts
                    .iter()
                    .filter(|p| matches!(p, Part::FunctionCall(_)))
                    .count();
                prop_assert_eq!(message.parts.len(), calls);
            }
        }
    }
}
