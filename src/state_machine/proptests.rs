//! Property-based tests for the state machine
//!
//! These tests drive whole conversations through `transition` and check
//! that the invariants hold for arbitrary input and classifier replies.

use super::intent::Intent;
use super::state::*;
use super::transition::*;
use super::*;
use crate::llm::LlmError;
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::collections::VecDeque;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new(DEFAULT_RETRY_CAP)
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Log of one simulated run: every intermediate state, oldest first
struct Run {
    states: Vec<ConversationState>,
    /// Number of turns each transition appended
    appended: Vec<usize>,
}

/// Drive the machine until it finishes or runs out of user lines.
///
/// Classifier replies are consumed in order; when they run out every call
/// fails. The responder always answers.
fn simulate(
    initial: ConversationState,
    inputs: Vec<String>,
    replies: Vec<Result<String, LlmError>>,
) -> Run {
    let ctx = test_context();
    let mut inputs: VecDeque<_> = inputs.into();
    let mut replies: VecDeque<_> = replies.into();
    let mut state = initial;
    let mut pending: Option<Event> = None;
    let mut run = Run {
        states: vec![state.clone()],
        appended: vec![],
    };

    // Generous bound; every input or reply is consumed within a few steps
    for _ in 0..500 {
        if state.step.is_terminal() {
            break;
        }
        let event = match pending.take() {
            Some(event) => event,
            None if state.step.awaits_input() => match inputs.pop_front() {
                Some(text) => Event::user_input(text, epoch()),
                None => break,
            },
            None => Event::Advance,
        };

        let result = transition(&state, &ctx, event).unwrap();
        run.appended.push(result.update.messages.len());
        state = state.merge(result.update);

        for effect in result.effects {
            pending = Some(match effect {
                Effect::Classify(_) => Event::Classified {
                    reply: replies
                        .pop_front()
                        .unwrap_or_else(|| Err(LlmError::network("no reply"))),
                },
                Effect::Respond(_) => Event::Responded {
                    reply: Ok("Sure.".to_string()),
                },
            });
        }
        run.states.push(state.clone());
    }
    run
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_user_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,20}",
        Just("my name is Ann".to_string()),
        Just("what is my name?".to_string()),
        Just("yes".to_string()),
        Just("no".to_string()),
        Just(String::new()),
    ]
}

fn arb_intent_reply() -> impl Strategy<Value = Result<String, LlmError>> {
    prop_oneof![
        "[a-z ]{0,10}".prop_map(|d| {
            Ok::<_, LlmError>(format!(r#"{{"intent": "add_item", "details": "{d}"}}"#))
        }),
        Just(Ok(r#"{"intent": "view_items", "details": ""}"#.to_string())),
        Just(Ok(r#"{"intent": "general_question", "details": ""}"#.to_string())),
        Just(Ok(r#"{"intent": "end_conversation", "details": ""}"#.to_string())),
        Just(Ok("not json".to_string())),
        Just(Err(LlmError::server_error("down"))),
    ]
}

fn arb_sentiment_reply() -> impl Strategy<Value = Result<String, LlmError>> {
    prop_oneof![
        Just(Ok("POSITIVE".to_string())),
        Just(Ok("NEGATIVE".to_string())),
        Just(Ok("UNCLEAR".to_string())),
        "[a-z]{0,8}".prop_map(Ok::<String, LlmError>),
        Just(Err(LlmError::network("timeout"))),
    ]
}

fn arb_unclear_reply() -> impl Strategy<Value = Result<String, LlmError>> {
    prop_oneof![
        Just(Ok("UNCLEAR".to_string())),
        Just(Ok("I can't tell".to_string())),
        Just(Err(LlmError::rate_limit("slow down"))),
    ]
}

fn arb_subject() -> impl Strategy<Value = Subject> {
    proptest::option::of("[A-Z][a-z]{2,8}").prop_map(|name| Subject { name, email: None })
}

fn arb_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        Just(Intent::AddItem),
        Just(Intent::ViewItems),
        Just(Intent::GeneralQuestion),
        Just(Intent::EndConversation),
    ]
}

fn arb_update() -> impl Strategy<Value = StateUpdate> {
    (
        proptest::collection::vec("[a-z ]{0,10}", 0..3),
        proptest::collection::vec("[a-z]{1,8}", 0..3),
        proptest::collection::vec(arb_intent(), 0..3),
        proptest::option::of("[A-Z][a-z]{2,6}"),
    )
        .prop_map(|(says, items, skills, name)| {
            let mut update = StateUpdate::stay();
            for text in says {
                update = update.say(text);
            }
            for text in items {
                update = update.with_item(Item {
                    text,
                    created_at: epoch(),
                });
            }
            for skill in skills {
                update = update.with_skill(skill);
            }
            if let Some(name) = name {
                update = update.with_name(name);
            }
            update
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Message log only grows, by exactly what each step appended
    #[test]
    fn prop_message_log_is_append_only(
        subject in arb_subject(),
        inputs in proptest::collection::vec(arb_user_text(), 0..12),
        replies in proptest::collection::vec(arb_intent_reply(), 0..12),
    ) {
        let run = simulate(ConversationState::new().with_subject(subject), inputs, replies);

        for (i, pair) in run.states.windows(2).enumerate() {
            let (before, after) = (&pair[0], &pair[1]);
            prop_assert_eq!(after.messages.len(), before.messages.len() + run.appended[i]);
            prop_assert_eq!(&after.messages[..before.messages.len()], &before.messages[..]);
            prop_assert!(after.items.len() >= before.items.len());
        }
        let total: usize = run.appended.iter().sum();
        prop_assert_eq!(run.states.last().unwrap().messages.len(), total);
    }

    // Once a name is known it never changes and capture never runs again
    #[test]
    fn prop_identity_capture_not_reentered(
        inputs in proptest::collection::vec(arb_user_text(), 0..12),
        replies in proptest::collection::vec(arb_intent_reply(), 0..12),
    ) {
        let run = simulate(ConversationState::new(), inputs, replies);

        let mut known: Option<String> = None;
        for state in &run.states {
            if let Some(name) = &known {
                prop_assert_eq!(state.subject.name.as_ref(), Some(name));
                prop_assert_ne!(&state.step, &Step::CaptureIdentity);
            }
            known.clone_from(&state.subject.name);
        }
    }

    // Attempts stay within the cap and reaching it always ends in one hand-off
    #[test]
    fn prop_attempts_bounded(
        inputs in proptest::collection::vec(arb_user_text(), 0..15),
        replies in proptest::collection::vec(arb_sentiment_reply(), 0..15),
    ) {
        let initial = ConversationState::intake(IntakeRecord::default())
            .with_subject(Subject { name: Some("Pat".to_string()), email: None });
        let run = simulate(initial, inputs, replies);
        let cap = test_context().retry_cap;

        for state in &run.states {
            prop_assert!(state.attempts <= cap);
            if state.attempts == cap {
                prop_assert!(matches!(state.step, Step::HandOff | Step::Done));
            }
        }
        for pair in run.states.windows(2) {
            prop_assert!(pair[1].attempts >= pair[0].attempts);
        }
    }

    // Cap consecutive ambiguous readings go straight to the hand-off
    #[test]
    fn prop_cap_ambiguous_replies_force_hand_off(
        replies in proptest::collection::vec(arb_unclear_reply(), 3),
        extra in proptest::collection::vec(arb_user_text(), 0..5),
    ) {
        let initial = ConversationState::intake(IntakeRecord::default())
            .with_subject(Subject { name: Some("Pat".to_string()), email: None });
        let mut inputs = vec!["maybe".to_string(); 3];
        inputs.extend(extra);
        let run = simulate(initial, inputs, replies);

        let last = run.states.last().unwrap();
        prop_assert_eq!(&last.step, &Step::Done);
        prop_assert_eq!(last.attempts, 3);

        let hand_off_at = run.states.iter().position(|s| s.step == Step::HandOff).unwrap();
        prop_assert_eq!(run.states[hand_off_at].attempts, 3);
        prop_assert_eq!(
            run.states[hand_off_at].messages.last().map(|t| t.role),
            Some(crate::llm::MessageRole::User)
        );
        // greeting + 3 user turns + 2 reprompts + 1 hand-off
        prop_assert_eq!(last.messages.len(), 7);
    }

    // Merge appends sequences, keeps the input intact, and records skills once
    #[test]
    fn prop_merge_appends(
        updates in proptest::collection::vec(arb_update(), 1..6),
    ) {
        let mut state = ConversationState::new();
        let mut expected_messages = 0;
        let mut expected_items = 0;

        for update in updates {
            let snapshot = state.clone();
            expected_messages += update.messages.len();
            expected_items += update.items.len();
            let skills = update.skills.clone();

            let next = state.merge(update);
            prop_assert_eq!(&state, &snapshot);
            for skill in skills {
                prop_assert!(next.skills_used.contains(&skill));
            }
            state = next;
        }

        prop_assert_eq!(state.messages.len(), expected_messages);
        prop_assert_eq!(state.items.len(), expected_items);
        for (i, skill) in state.skills_used.iter().enumerate() {
            prop_assert!(!state.skills_used[i + 1..].contains(skill));
        }
    }

    // The machine is deterministic for identical inputs
    #[test]
    fn prop_transitions_deterministic(
        inputs in proptest::collection::vec(arb_user_text(), 0..8),
        replies in proptest::collection::vec(arb_intent_reply(), 0..8),
    ) {
        let a = simulate(ConversationState::new(), inputs.clone(), replies.clone());
        let b = simulate(ConversationState::new(), inputs, replies);
        prop_assert_eq!(a.states, b.states);
    }
}
