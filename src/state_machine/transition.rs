//! Pure state transition function
//!
//! Every step reads the current state and returns a partial update plus any
//! external calls to make. Nothing here performs I/O or reads the clock.

use super::effect::Effect;
use super::event::Event;
use super::intent::{parse_intent, parse_sentiment, Classification, Intent, Sentiment};
use super::state::{
    ConvContext, ConversationState, InputRoute, IntakeRecord, Item, StateUpdate, Step, TaskStatus,
    Variant,
};
use crate::llm::LlmError;
use crate::prompts;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Words that end the session at any input-collection point
pub const EXIT_KEYWORDS: &[&str] = &["exit", "quit", "bye"];

const IDENTITY_PREFIXES: &[&str] = &["my name is", "i am", "i'm", "call me", "this is"];
const MAX_NAME_WORDS: usize = 4;
const AFFIRMATIVES: &[&str] = &["yes", "yeah", "yep", "sure", "y", "ok", "okay"];

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub update: StateUpdate,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(update: StateUpdate) -> Self {
        Self {
            update,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// No handler for this step and event; a programming error
    #[error("No handler for step '{step}' on event '{event}'")]
    UnknownStep {
        step: &'static str,
        event: &'static str,
    },
    #[error("User input arrived at step '{0}', which is not waiting for input")]
    NotAwaitingInput(&'static str),
    #[error("Conversation has already finished")]
    Finished,
}

/// The bounded-retry loop ran out of attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Gave up after {attempts} ambiguous replies")]
pub struct RetryCapExceeded {
    pub attempts: u32,
}

/// Count one more ambiguous reading against the cap
pub fn charge_attempt(attempts: u32, cap: u32) -> Result<u32, RetryCapExceeded> {
    let attempts = attempts.saturating_add(1);
    if attempts >= cap {
        Err(RetryCapExceeded { attempts })
    } else {
        Ok(attempts)
    }
}

pub fn is_exit_keyword(text: &str) -> bool {
    let word = text.trim().trim_end_matches(['!', '.']);
    EXIT_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

/// Pull a name out of an introduction.
///
/// Known prefixes ("my name is", "i'm", ...) are stripped and whatever
/// follows is taken as the name. Without a prefix only short replies count.
/// Questions and empty text are rejected.
pub fn extract_identity(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.contains('?') {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let after_prefix = IDENTITY_PREFIXES.iter().find_map(|prefix| {
        let rest = lower.strip_prefix(*prefix)?;
        let at_boundary =
            rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ',' || c == ':');
        if at_boundary {
            trimmed.get(prefix.len()..)
        } else {
            None
        }
    });

    let name = after_prefix
        .unwrap_or(trimmed)
        .trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .to_string();

    let words = name.split_whitespace().count();
    let too_long = after_prefix.is_none() && words > MAX_NAME_WORDS;
    if words == 0 || too_long {
        None
    } else {
        Some(name)
    }
}

fn is_affirmative(text: &str) -> bool {
    let lower = text.trim().to_ascii_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .is_some_and(|first| AFFIRMATIVES.contains(&first))
}

/// Pure transition function
///
/// Given the same state, context and event it always produces the same
/// result.
pub fn transition(
    state: &ConversationState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.step, event) {
        (Step::Done, _) => Err(TransitionError::Finished),

        // ============================================================
        // Input collection
        // ============================================================
        (Step::AwaitInput { route }, Event::UserInput { text, at }) => {
            let next = route_input(state, *route, at);
            Ok(TransitionResult::new(StateUpdate::goto(next).heard(text)))
        }

        (step, Event::UserInput { .. }) => Err(TransitionError::NotAwaitingInput(step.label())),

        // ============================================================
        // Greeting and identity
        // ============================================================
        (Step::Greet, Event::Advance) => {
            let name = state.subject.name.as_deref();
            let update = match &state.intake {
                None => StateUpdate::goto(Step::await_input(InputRoute::Identity))
                    .say(prompts::greeting(name)),
                Some(intake) => {
                    let route = if name.is_some() {
                        InputRoute::Sentiment
                    } else {
                        InputRoute::Identity
                    };
                    StateUpdate::goto(Step::await_input(route))
                        .say(prompts::intake_greeting(name, intake))
                }
            };
            Ok(TransitionResult::new(update))
        }

        (Step::CaptureIdentity, Event::Advance)
            if state.subject.name.is_none() && state.user_spoke_last() =>
        {
            let heard = state.last_user_text().unwrap_or_default();
            let update = match extract_identity(heard) {
                Some(name) => match &state.intake {
                    None => StateUpdate::goto(Step::await_input(InputRoute::Intent))
                        .say(prompts::name_acknowledged(&name))
                        .with_name(name),
                    Some(intake) => StateUpdate::goto(Step::await_input(InputRoute::Sentiment))
                        .say(prompts::customer_acknowledged(&name, intake))
                        .with_name(name),
                },
                None => StateUpdate::goto(Step::await_input(InputRoute::Identity))
                    .say(prompts::NAME_REPROMPT),
            };
            Ok(TransitionResult::new(update))
        }

        // ============================================================
        // Intent classification and handlers
        // ============================================================
        (Step::Classify { .. }, Event::Advance) => {
            let heard = state.last_user_text().unwrap_or_default();
            Ok(TransitionResult::new(StateUpdate::stay())
                .with_effect(Effect::classify_intent(prompts::INTENT_INSTRUCTION, heard)))
        }

        (Step::Classify { at }, Event::Classified { reply }) => {
            Ok(TransitionResult::new(route_intent(reply, *at)))
        }

        (Step::AddItem { detail, at }, Event::Advance) => {
            let detail = detail.trim();
            let update = if detail.is_empty() {
                StateUpdate::goto(Step::await_input(InputRoute::Intent)).say(prompts::EMPTY_ITEM)
            } else {
                StateUpdate::goto(Step::await_input(InputRoute::Intent))
                    .say(prompts::item_added(detail))
                    .with_item(Item {
                        text: detail.to_string(),
                        created_at: *at,
                    })
            };
            Ok(TransitionResult::new(update))
        }

        (Step::ViewItems, Event::Advance) => Ok(TransitionResult::new(
            StateUpdate::goto(Step::await_input(InputRoute::Intent))
                .say(prompts::item_listing(&state.items)),
        )),

        (Step::GeneralQuestion, Event::Advance) => {
            let system = prompts::productivity_system(state.subject.name.as_deref());
            Ok(TransitionResult::new(StateUpdate::stay())
                .with_effect(Effect::respond(system, state.messages.clone())))
        }

        (Step::GeneralQuestion, Event::Responded { reply }) => {
            let text = reply.unwrap_or_else(|_| prompts::RESPOND_UNAVAILABLE.to_string());
            Ok(TransitionResult::new(
                StateUpdate::goto(Step::await_input(InputRoute::Intent)).say(text),
            ))
        }

        (Step::EndConversation, Event::Advance) => Ok(TransitionResult::new(
            StateUpdate::goto(Step::Done).say(prompts::farewell(
                state.items.len(),
                state.skills_used.len(),
            )),
        )),

        // ============================================================
        // Scheduling with bounded retry
        // ============================================================
        (Step::AnalyzeSentiment, Event::Advance) if state.intake.is_some() => {
            let heard = state.last_user_text().unwrap_or_default();
            Ok(TransitionResult::new(StateUpdate::stay())
                .with_effect(Effect::classify_sentiment(prompts::SENTIMENT_INSTRUCTION, heard)))
        }

        (Step::AnalyzeSentiment, Event::Classified { reply }) => {
            let intake = intake_record(state, "classified")?;
            Ok(TransitionResult::new(route_sentiment(
                state, context, intake, reply,
            )))
        }

        (Step::Reschedule, Event::Advance) => {
            let intake = intake_record(state, "advance")?;
            let preferred = state.last_user_text().unwrap_or_default().trim();
            Ok(TransitionResult::new(
                StateUpdate::goto(Step::await_input(InputRoute::ConfirmEnd))
                    .say(prompts::reschedule_noted(preferred, intake))
                    .with_schedule(preferred),
            ))
        }

        (Step::ConfirmEnd, Event::Advance) => {
            let intake = intake_record(state, "advance")?;
            let heard = state.last_user_text().unwrap_or_default();
            let update = if is_affirmative(heard) {
                StateUpdate::goto(Step::await_input(InputRoute::Additional))
                    .say(prompts::ask_additional(intake))
            } else {
                StateUpdate::goto(Step::Done).say(prompts::intake_closing(intake))
            };
            Ok(TransitionResult::new(update))
        }

        (Step::ProcessAdditional { at }, Event::Advance) => {
            let intake = intake_record(state, "advance")?;
            let note = state.last_user_text().unwrap_or_default().trim();
            let mut update = StateUpdate::goto(Step::await_input(InputRoute::ConfirmEnd))
                .say(prompts::additional_noted(intake));
            if !note.is_empty() {
                update = update.with_item(Item {
                    text: note.to_string(),
                    created_at: *at,
                });
            }
            Ok(TransitionResult::new(update))
        }

        (Step::HandOff, Event::Advance) => {
            let intake = intake_record(state, "advance")?;
            Ok(TransitionResult::new(
                StateUpdate::goto(Step::Done)
                    .say(prompts::hand_off(intake))
                    .with_task_status(TaskStatus::HandedOff),
            ))
        }

        // ============================================================
        // Everything else
        // ============================================================
        (step, event) => Err(TransitionError::UnknownStep {
            step: step.label(),
            event: event.name(),
        }),
    }
}

/// Step that handles text arriving at an input-collection point
fn route_input(state: &ConversationState, route: InputRoute, at: DateTime<Utc>) -> Step {
    match route {
        InputRoute::Identity if state.subject.name.is_none() => Step::CaptureIdentity,
        InputRoute::Identity | InputRoute::Intent | InputRoute::Sentiment => {
            match state.variant() {
                Variant::Productivity => Step::Classify { at },
                Variant::Intake => Step::AnalyzeSentiment,
            }
        }
        InputRoute::Reschedule => Step::Reschedule,
        InputRoute::ConfirmEnd => Step::ConfirmEnd,
        InputRoute::Additional => Step::ProcessAdditional { at },
    }
}

fn route_intent(reply: Result<String, LlmError>, at: DateTime<Utc>) -> StateUpdate {
    let Ok(raw) = reply else {
        return StateUpdate::goto(Step::await_input(InputRoute::Intent))
            .say(prompts::CLASSIFY_UNAVAILABLE);
    };

    let Classification { intent, detail } =
        parse_intent(&raw).unwrap_or_else(|_| Classification::general());

    let next = match intent {
        Intent::AddItem => Step::AddItem { detail, at },
        Intent::ViewItems => Step::ViewItems,
        Intent::GeneralQuestion => Step::GeneralQuestion,
        Intent::EndConversation => Step::EndConversation,
    };
    StateUpdate::goto(next).with_skill(intent)
}

fn route_sentiment(
    state: &ConversationState,
    context: &ConvContext,
    intake: &IntakeRecord,
    reply: Result<String, LlmError>,
) -> StateUpdate {
    let reading = reply.as_deref().map(parse_sentiment);

    match reading {
        Ok(Sentiment::Positive) => StateUpdate::goto(Step::await_input(InputRoute::ConfirmEnd))
            .say(prompts::schedule_confirmed(intake))
            .with_sentiment(Sentiment::Positive)
            .with_task_status(TaskStatus::Scheduled),
        Ok(Sentiment::Negative) => StateUpdate::goto(Step::await_input(InputRoute::Reschedule))
            .say(prompts::ASK_BETTER_TIME)
            .with_sentiment(Sentiment::Negative)
            .with_task_status(TaskStatus::Rescheduling),
        Ok(Sentiment::Unclear) | Err(_) => {
            let reprompt = if reading.is_ok() {
                prompts::SENTIMENT_REPROMPT
            } else {
                prompts::SENTIMENT_TROUBLE
            };
            match charge_attempt(state.attempts, context.retry_cap) {
                Ok(attempts) => StateUpdate::goto(Step::await_input(InputRoute::Sentiment))
                    .say(reprompt)
                    .with_attempts(attempts)
                    .with_sentiment(Sentiment::Unclear),
                Err(RetryCapExceeded { attempts }) => StateUpdate::goto(Step::HandOff)
                    .with_attempts(attempts)
                    .with_sentiment(Sentiment::Unclear),
            }
        }
    }
}

fn intake_record<'a>(
    state: &'a ConversationState,
    event: &'static str,
) -> Result<&'a IntakeRecord, TransitionError> {
    state.intake.as_ref().ok_or(TransitionError::UnknownStep {
        step: state.step.label(),
        event,
    })
}
