//! Effects produced by state transitions

use super::state::Turn;

/// What the classifier is being asked to decide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyKind {
    Intent,
    Sentiment,
}

/// One classifier call: a fixed instruction plus the text to label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyRequest {
    pub kind: ClassifyKind,
    pub instruction: String,
    pub text: String,
}

/// One responder call: a system prompt plus the turn history so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondRequest {
    pub system: String,
    pub history: Vec<Turn>,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the classifier; the reply comes back as `Event::Classified`
    Classify(ClassifyRequest),

    /// Ask the responder; the reply comes back as `Event::Responded`
    Respond(RespondRequest),
}

impl Effect {
    pub fn classify_intent(instruction: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::Classify(ClassifyRequest {
            kind: ClassifyKind::Intent,
            instruction: instruction.into(),
            text: text.into(),
        })
    }

    pub fn classify_sentiment(instruction: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::Classify(ClassifyRequest {
            kind: ClassifyKind::Sentiment,
            instruction: instruction.into(),
            text: text.into(),
        })
    }

    pub fn respond(system: impl Into<String>, history: Vec<Turn>) -> Self {
        Effect::Respond(RespondRequest {
            system: system.into(),
            history,
        })
    }
}
