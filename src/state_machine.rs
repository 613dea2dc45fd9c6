//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! Steps return partial updates; the runtime merges them and performs the
//! requested external calls.

pub mod effect;
pub mod event;
pub mod intent;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{ClassifyKind, ClassifyRequest, Effect, RespondRequest};
pub use event::Event;
pub use intent::Intent;
pub use state::{ConvContext, ConversationState, IntakeRecord, StateUpdate, Step, Subject, Variant};
pub use transition::{is_exit_keyword, transition, TransitionError};
