//! Prompt text and canned assistant lines
//!
//! Everything the agent says without asking a model lives here, so the
//! transition function stays free of string literals and the scripted
//! stand-in can recognise which instruction it was handed.

use crate::state_machine::state::{IntakeRecord, Item};

/// Display name of the productivity agent
pub const AGENT_NAME: &str = "007";

/// Instruction sent with the last user turn to classify intent
pub const INTENT_INSTRUCTION: &str = r#"You are analyzing user input to determine their intent.
Categories:
- add_item: User wants to add a task to their todo list
- view_items: User wants to see their todo list
- general_question: User has a general question
- end_conversation: User wants to end the conversation

Format your response as a JSON object with two fields:
- "intent": One of the categories above
- "details": Additional details extracted from the message

Example:
{"intent": "add_item", "details": "Buy milk tomorrow"}"#;

/// Instruction sent with the last user turn to read a yes/no scheduling reply
pub const SENTIMENT_INSTRUCTION: &str = "Analyze if the user agrees to schedule a consultation for tomorrow. Respond with only: POSITIVE, NEGATIVE, or UNCLEAR";

/// Marker the responder system prompt uses to state the user's name
pub const NAME_MARKER: &str = "The user's name is ";

/// System prompt for free-form answers in the productivity variant
pub fn productivity_system(user_name: Option<&str>) -> String {
    let name = user_name.unwrap_or("unknown");
    format!(
        "You are {AGENT_NAME}, a personal productivity agent.
You help users manage their tasks, find information, and boost their productivity.
You have a friendly, helpful tone.
{NAME_MARKER}{name}.
Keep your responses concise and focused.

If the user asks about their name and it is unknown, ask for it instead of guessing.
If the user asks about tasks, offer to create a task for them."
    )
}

pub fn greeting(user_name: Option<&str>) -> String {
    match user_name {
        Some(name) => format!(
            "Hello {name}! I'm {AGENT_NAME}, your personal productivity agent. How can I help you today?"
        ),
        None => format!(
            "Hello! I'm {AGENT_NAME}, your personal productivity agent. I don't think we've met before. What's your name?"
        ),
    }
}

pub fn intake_greeting(customer_name: Option<&str>, intake: &IntakeRecord) -> String {
    match customer_name {
        Some(name) => format!(
            "Hello {name}! I'm your project coordinator. I'll help you with your {}. Would you like me to schedule an appointment with {}?",
            intake.task.description, intake.vendor.name
        ),
        None => format!(
            "Hello! I'm your project coordinator. I'll help you with your {}. What's your name?",
            intake.task.description
        ),
    }
}

pub fn name_acknowledged(name: &str) -> String {
    format!("Nice to meet you, {name}! How can I help you today?")
}

pub fn customer_acknowledged(name: &str, intake: &IntakeRecord) -> String {
    format!(
        "Thank you, {name}! I'll help you with your {}. Would you like me to schedule an appointment with {} for the installation?",
        intake.task.description, intake.vendor.name
    )
}

pub const NAME_REPROMPT: &str =
    "I don't know your name yet, and I didn't catch it there. What should I call you?";

pub fn item_added(item: &str) -> String {
    format!("I've added \"{item}\" to your todo list. Is there anything else you'd like me to do?")
}

pub const EMPTY_ITEM: &str =
    "I didn't catch what to add. What should I put on your todo list?";

pub fn item_listing(items: &[Item]) -> String {
    if items.is_empty() {
        return "You don't have any tasks in your todo list yet. Would you like to add one?"
            .to_string();
    }
    let mut out = String::from("Here's your current todo list:\n");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, item.text));
    }
    out.push_str("\nIs there anything else you'd like me to do?");
    out
}

pub fn farewell(items_added: usize, skills_used: usize) -> String {
    let mut out = String::from("It was great helping you today! ");
    match items_added {
        0 => {}
        1 => out.push_str("I've added 1 task to your todo list. "),
        n => out.push_str(&format!("I've added {n} tasks to your todo list. ")),
    }
    if skills_used > 1 {
        out.push_str(&format!("We covered {skills_used} different kinds of requests. "));
    }
    out.push_str("Feel free to come back anytime you need assistance with your productivity.");
    out
}

pub const CLASSIFY_UNAVAILABLE: &str =
    "I'm sorry, but I'm having trouble processing your request right now. Please try again.";

pub const RESPOND_UNAVAILABLE: &str =
    "I'm sorry, but I'm having trouble answering your question right now. Please try again later.";

pub fn schedule_confirmed(intake: &IntakeRecord) -> String {
    format!(
        "Great! I'll have {} contact you to confirm the details. Is there anything else you'd like me to pass along?",
        intake.vendor.name
    )
}

pub const ASK_BETTER_TIME: &str = "I understand. When would be a better time for you?";

pub const SENTIMENT_REPROMPT: &str =
    "I'm not sure if that's a yes or no. Would you like me to schedule the consultation for tomorrow?";

pub const SENTIMENT_TROUBLE: &str =
    "I'm having trouble understanding. Could you please answer with a simple yes or no?";

pub fn reschedule_noted(preferred: &str, intake: &IntakeRecord) -> String {
    format!(
        "Thank you for letting me know. I'll ask {} to contact you about \"{preferred}\". Is there anything else you'd like me to pass along?",
        intake.vendor.name
    )
}

pub fn ask_additional(intake: &IntakeRecord) -> String {
    format!(
        "What else can I help you with regarding your {}?",
        intake.task.description
    )
}

pub fn additional_noted(intake: &IntakeRecord) -> String {
    format!(
        "I'll make sure to pass this information to {}. They will address this when they contact you. Is there anything else?",
        intake.vendor.name
    )
}

pub fn intake_closing(intake: &IntakeRecord) -> String {
    format!(
        "Great! {} will be in touch soon. Have a wonderful day!",
        intake.vendor.name
    )
}

pub fn hand_off(intake: &IntakeRecord) -> String {
    format!(
        "I'll have {} contact you to discuss the scheduling details directly. Have a great day!",
        intake.vendor.name
    )
}

/// Line printed by the driver when the user types an exit keyword
pub const GOODBYE: &str = "Goodbye!";
