//! Runtime for executing conversations
//!
//! Owns the conversation state, reads user input, and performs the external
//! calls the state machine asks for.

mod executor;
pub mod traits;


pub use executor::ConversationRuntime;
pub use traits::*;

use crate::state_machine::{ConversationState, IntakeRecord, Subject, TransitionError, Variant};
use thiserror::Error;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<ModelClassifier, ModelResponder, StdioConsole>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fresh state for a new session of the given variant
pub fn initial_state(variant: Variant, subject: Subject) -> ConversationState {
    let state = match variant {
        Variant::Productivity => ConversationState::new(),
        Variant::Intake => ConversationState::intake(IntakeRecord::default()),
    };
    state.with_subject(subject)
}
