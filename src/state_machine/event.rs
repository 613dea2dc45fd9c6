//! Events that can occur in a conversation

use crate::llm::LlmError;
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Run the current step without new input
    Advance,

    // User events
    UserInput {
        text: String,
        /// Arrival time, stamped by the driver so transitions stay pure
        at: DateTime<Utc>,
    },

    // External call events
    Classified {
        reply: Result<String, LlmError>,
    },
    Responded {
        reply: Result<String, LlmError>,
    },
}

impl Event {
    pub fn user_input(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Event::UserInput {
            text: text.into(),
            at,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Advance => "advance",
            Event::UserInput { .. } => "user_input",
            Event::Classified { .. } => "classified",
            Event::Responded { .. } => "responded",
        }
    }
}
