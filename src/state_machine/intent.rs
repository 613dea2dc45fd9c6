//! Parsing of classifier replies

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of intent labels the classifier may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[serde(alias = "add_todo")]
    AddItem,
    #[serde(alias = "view_todos")]
    ViewItems,
    GeneralQuestion,
    EndConversation,
}

impl Intent {
    pub fn label(self) -> &'static str {
        match self {
            Intent::AddItem => "add_item",
            Intent::ViewItems => "view_items",
            Intent::GeneralQuestion => "general_question",
            Intent::EndConversation => "end_conversation",
        }
    }
}

/// Parsed `{"intent": ..., "details": ...}` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub detail: String,
}

impl Classification {
    /// Fallback used when the reply cannot be parsed
    pub fn general() -> Self {
        Self {
            intent: Intent::GeneralQuestion,
            detail: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationParseError {
    #[error("no JSON object in classifier reply")]
    NoObject,
    #[error("malformed classifier reply: {0}")]
    Malformed(String),
}

#[derive(Deserialize)]
struct RawClassification {
    intent: Intent,
    #[serde(default, alias = "detail")]
    details: Option<String>,
}

/// Parse the classifier's JSON reply.
///
/// Models like to wrap JSON in prose or code fences, so the outermost
/// `{ ... }` span is extracted before decoding.
pub fn parse_intent(raw: &str) -> Result<Classification, ClassificationParseError> {
    let start = raw.find('{').ok_or(ClassificationParseError::NoObject)?;
    let end = raw.rfind('}').ok_or(ClassificationParseError::NoObject)?;
    if end < start {
        return Err(ClassificationParseError::NoObject);
    }

    let object = raw
        .get(start..=end)
        .ok_or(ClassificationParseError::NoObject)?;
    let parsed: RawClassification = serde_json::from_str(object)
        .map_err(|e| ClassificationParseError::Malformed(e.to_string()))?;

    Ok(Classification {
        intent: parsed.intent,
        detail: parsed.details.unwrap_or_default().trim().to_string(),
    })
}

/// Reading of a yes/no reply to the scheduling offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Unclear,
}

/// Anything other than a clear POSITIVE or NEGATIVE counts as unclear
pub fn parse_sentiment(raw: &str) -> Sentiment {
    let upper = raw.trim().to_ascii_uppercase();
    let has_pos = upper.contains("POSITIVE");
    let has_neg = upper.contains("NEGATIVE");
    match (has_pos, has_neg) {
        (true, false) => Sentiment::Positive,
        (false, true) => Sentiment::Negative,
        _ => Sentiment::Unclear,
    }
}
