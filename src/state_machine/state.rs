//! Conversation state types

use super::intent::{Intent, Sentiment};
use crate::llm::MessageRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cap on ambiguous sentiment readings before handing off to a human
pub const DEFAULT_RETRY_CAP: u32 = 3;

// ============================================================================
// Steps
// ============================================================================

/// Where user text goes once it arrives at an input-collection point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRoute {
    /// Identity capture while the subject is unknown, classification after
    Identity,
    /// Intent classification
    Intent,
    /// Yes/no reading of the scheduling offer
    Sentiment,
    /// Preferred time after a declined slot
    Reschedule,
    /// "Anything else?" answer
    ConfirmEnd,
    /// Free-form notes for the vendor
    Additional,
}

/// The machine's program counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Opening line
    Greet,
    /// Waiting for one line of user text
    AwaitInput { route: InputRoute },
    CaptureIdentity,
    /// Classifier request outstanding or about to be issued.
    /// `at` is when the text being classified arrived.
    Classify { at: DateTime<Utc> },
    AddItem { detail: String, at: DateTime<Utc> },
    ViewItems,
    /// Responder request outstanding or about to be issued
    GeneralQuestion,
    EndConversation,
    /// Bounded-retry yes/no classification (intake only)
    AnalyzeSentiment,
    Reschedule,
    ConfirmEnd,
    ProcessAdditional { at: DateTime<Utc> },
    /// Hand-off to the vendor's staff; ends the session
    HandOff,
    /// Terminal sentinel
    Done,
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Done)
    }

    /// Input-collection points, where exit keywords are honoured
    pub fn awaits_input(&self) -> bool {
        matches!(self, Step::AwaitInput { .. })
    }

    pub fn await_input(route: InputRoute) -> Self {
        Step::AwaitInput { route }
    }

    /// Short label for logs and diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Step::Greet => "greet",
            Step::AwaitInput { .. } => "await_input",
            Step::CaptureIdentity => "capture_identity",
            Step::Classify { .. } => "classify",
            Step::AddItem { .. } => "add_item",
            Step::ViewItems => "view_items",
            Step::GeneralQuestion => "general_question",
            Step::EndConversation => "end_conversation",
            Step::AnalyzeSentiment => "analyze_sentiment",
            Step::Reschedule => "reschedule",
            Step::ConfirmEnd => "confirm_end",
            Step::ProcessAdditional { .. } => "process_additional",
            Step::HandOff => "hand_off",
            Step::Done => "done",
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One entry in the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

/// Who we are talking to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: Option<String>,
    /// Supplied by the caller; kept for the session only
    pub email: Option<String>,
}

/// A collected todo item or intake note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    New,
    Scheduled,
    Rescheduling,
    HandedOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    /// Customer's preferred time, when they declined the offered slot
    pub schedule: Option<String>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub name: String,
    pub email: String,
}

/// Task and vendor data for the intake variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub task: Task,
    pub vendor: Vendor,
    pub sentiment: Option<Sentiment>,
}

impl Default for IntakeRecord {
    fn default() -> Self {
        Self {
            task: Task {
                description: "kitchen faucet installation".to_string(),
                schedule: None,
                status: TaskStatus::New,
            },
            vendor: Vendor {
                name: "Dave's Plumbing".to_string(),
                email: "dave@plumbing.com".to_string(),
            },
            sentiment: None,
        }
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// The whole conversation, replaced wholesale after every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub subject: Subject,
    /// Present only for the intake variant
    pub intake: Option<IntakeRecord>,
    pub messages: Vec<Turn>,
    pub step: Step,
    /// Ambiguous sentiment readings so far; never reset mid-session
    pub attempts: u32,
    pub items: Vec<Item>,
    /// Intents seen this session, first use first, no duplicates
    pub skills_used: Vec<Intent>,
}

impl ConversationState {
    /// Empty productivity session
    pub fn new() -> Self {
        Self {
            subject: Subject::default(),
            intake: None,
            messages: Vec::new(),
            step: Step::Greet,
            attempts: 0,
            items: Vec::new(),
            skills_used: Vec::new(),
        }
    }

    /// Empty intake session with the given task and vendor
    pub fn intake(record: IntakeRecord) -> Self {
        Self {
            intake: Some(record),
            ..Self::new()
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = subject;
        self
    }

    pub fn variant(&self) -> Variant {
        if self.intake.is_some() {
            Variant::Intake
        } else {
            Variant::Productivity
        }
    }

    /// Most recent user turn, if the user has spoken
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|t| t.role == MessageRole::User)
            .map(|t| t.text.as_str())
    }

    /// Whether the latest turn in the log came from the user
    pub fn user_spoke_last(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|t| t.role == MessageRole::User)
    }

    pub fn assistant_turns(&self) -> impl Iterator<Item = &Turn> {
        self.messages
            .iter()
            .filter(|t| t.role == MessageRole::Assistant)
    }

    /// Apply a partial update, producing the next state.
    ///
    /// Scalars overwrite when present; `messages` and `items` append;
    /// `skills` insert once each.
    #[must_use]
    pub fn merge(&self, update: StateUpdate) -> ConversationState {
        let mut next = self.clone();

        if let Some(step) = update.step {
            next.step = step;
        }
        if let Some(name) = update.name {
            next.subject.name = Some(name);
        }
        if let Some(attempts) = update.attempts {
            next.attempts = attempts;
        }
        if let Some(intake) = next.intake.as_mut() {
            if let Some(schedule) = update.schedule {
                intake.task.schedule = Some(schedule);
            }
            if let Some(status) = update.task_status {
                intake.task.status = status;
            }
            if let Some(sentiment) = update.sentiment {
                intake.sentiment = Some(sentiment);
            }
        }

        next.messages.extend(update.messages);
        next.items.extend(update.items);
        for skill in update.skills {
            if !next.skills_used.contains(&skill) {
                next.skills_used.push(skill);
            }
        }

        next
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Which script the session follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Personal productivity agent with a todo list
    Productivity,
    /// Vendor intake coordinator with bounded-retry scheduling
    Intake,
}

// ============================================================================
// State Update
// ============================================================================

/// Partial update returned by a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// Next step; `None` keeps the current one
    pub step: Option<Step>,
    pub name: Option<String>,
    pub attempts: Option<u32>,
    pub schedule: Option<String>,
    pub task_status: Option<TaskStatus>,
    pub sentiment: Option<Sentiment>,
    pub messages: Vec<Turn>,
    pub items: Vec<Item>,
    pub skills: Vec<Intent>,
}

impl StateUpdate {
    pub fn goto(step: Step) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    /// Stay on the current step
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Turn::assistant(text));
        self
    }

    pub fn heard(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Turn::user(text));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_skill(mut self, skill: Intent) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn with_task_status(mut self, status: TaskStatus) -> Self {
        self.task_status = Some(status);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

// ============================================================================
// Context
// ============================================================================

/// Per-session configuration (immutable)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
    /// Ambiguous readings allowed before the hand-off
    pub retry_cap: u32,
}

impl ConvContext {
    pub fn new(retry_cap: u32) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            retry_cap,
        }
    }
}

impl Default for ConvContext {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_CAP)
    }
}
