//! Deterministic keyword-driven stand-in for a live model
//!
//! Recognises which instruction it was sent and answers in the same shape a
//! real model would, so offline runs exercise the normal parsing paths.

use super::types::{LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use crate::prompts::{INTENT_INSTRUCTION, NAME_MARKER, SENTIMENT_INSTRUCTION};
use async_trait::async_trait;
use serde_json::json;

const MODEL_ID: &str = "scripted";

const END_PHRASES: &[&str] = &["bye", "goodbye", "that's all", "that is all", "see you", "i'm done"];
const VIEW_VERBS: &[&str] = &["show", "view", "list", "what's on", "what is on", "see"];
const VIEW_NOUNS: &[&str] = &["todo", "task", "list"];
const UNSURE_PHRASES: &[&str] = &["not sure", "maybe", "don't know", "dont know", "unsure"];
const NEGATIVE_WORDS: &[&str] = &["no", "nope", "not", "can't", "cannot", "later", "busy"];
const POSITIVE_WORDS: &[&str] = &["yes", "yeah", "yep", "sure", "ok", "okay", "please", "great"];

/// Offline model used with `--mocked`
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel;

impl ScriptedModel {
    pub fn new() -> Self {
        Self
    }

    fn classify_intent(text: &str) -> String {
        let lower = text.trim().to_lowercase();

        let (intent, details) = if let Some(item) = item_from(text) {
            ("add_item", item)
        } else if VIEW_VERBS.iter().any(|v| lower.contains(v))
            && VIEW_NOUNS.iter().any(|n| lower.contains(n))
        {
            ("view_items", String::new())
        } else if END_PHRASES.iter().any(|p| lower.contains(p)) {
            ("end_conversation", String::new())
        } else {
            ("general_question", String::new())
        };

        json!({ "intent": intent, "details": details }).to_string()
    }

    fn classify_sentiment(text: &str) -> &'static str {
        let lower = text.to_lowercase();
        if UNSURE_PHRASES.iter().any(|p| lower.contains(p)) {
            return "UNCLEAR";
        }
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();
        if words.iter().any(|w| NEGATIVE_WORDS.contains(w)) {
            "NEGATIVE"
        } else if words.iter().any(|w| POSITIVE_WORDS.contains(w)) {
            "POSITIVE"
        } else {
            "UNCLEAR"
        }
    }

    fn respond(system: &str, text: &str) -> String {
        let lower = text.to_lowercase();
        if lower.contains("my name") || lower.contains("who am i") {
            return match name_from(system) {
                Some(name) => format!("Your name is {name}."),
                None => "I don't know your name yet. What should I call you?".to_string(),
            };
        }
        if lower.contains("task") || lower.contains("todo") {
            return "I can add that to your todo list. Just say \"add\" followed by the task."
                .to_string();
        }
        "I understand. How can I assist you further?".to_string()
    }
}

/// Item text from "add ..." or "remind me to ..."
fn item_from(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    let start = if lower.starts_with("add ") {
        "add ".len()
    } else {
        lower.find("remind me to ")? + "remind me to ".len()
    };
    let rest = trimmed.get(start..)?;
    let lower_rest = rest.to_ascii_lowercase();
    let end = ["to my todo list", "to my list", "to the list"]
        .iter()
        .find_map(|suffix| lower_rest.rfind(suffix))
        .unwrap_or(rest.len());
    let item = rest.get(..end)?.trim().trim_end_matches('.').trim();
    (!item.is_empty()).then(|| item.to_string())
}

/// The user's name as stated in a system prompt, unless unknown
fn name_from(system: &str) -> Option<&str> {
    let start = system.find(NAME_MARKER)? + NAME_MARKER.len();
    let rest = system.get(start..)?;
    let name = rest.split(['.', '\n']).next()?.trim();
    (!name.is_empty() && name != "unknown").then_some(name)
}

#[async_trait]
impl LlmService for ScriptedModel {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.text.as_str())
            .unwrap_or_default();

        let reply = match request.system.as_deref() {
            Some(INTENT_INSTRUCTION) => Self::classify_intent(text),
            Some(SENTIMENT_INSTRUCTION) => Self::classify_sentiment(text).to_string(),
            Some(system) => Self::respond(system, text),
            None => Self::respond("", text),
        };

        Ok(LlmResponse {
            text: reply,
            usage: Usage::default(),
        })
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }
}
