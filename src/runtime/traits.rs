//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService};
use crate::state_machine::{ClassifyKind, ClassifyRequest, RespondRequest};
use async_trait::async_trait;
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Maps text to a label under a fixed instruction
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, LlmError>;
}

/// Produces free-form assistant text from a turn history
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, request: &RespondRequest) -> Result<String, LlmError>;
}

/// The interactive text interface
#[async_trait]
pub trait UserIo: Send + Sync {
    /// Read one line of user text; `None` at end of input
    async fn read_line(&self) -> std::io::Result<Option<String>>;

    /// Print one assistant line
    fn show(&self, text: &str);
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, LlmError> {
        (**self).classify(request).await
    }
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, request: &RespondRequest) -> Result<String, LlmError> {
        (**self).respond(request).await
    }
}

#[async_trait]
impl<T: UserIo + ?Sized> UserIo for Arc<T> {
    async fn read_line(&self) -> std::io::Result<Option<String>> {
        (**self).read_line().await
    }

    fn show(&self, text: &str) {
        (**self).show(text);
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Token limits per classification kind; labels are short
const INTENT_MAX_TOKENS: u32 = 200;
const SENTIMENT_MAX_TOKENS: u32 = 10;

/// Adapter to use an `LlmService` as a `Classifier`
#[derive(Clone)]
pub struct ModelClassifier {
    llm: Arc<dyn LlmService>,
}

impl ModelClassifier {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, LlmError> {
        let max_tokens = match request.kind {
            ClassifyKind::Intent => INTENT_MAX_TOKENS,
            ClassifyKind::Sentiment => SENTIMENT_MAX_TOKENS,
        };
        let llm_request = LlmRequest::new(
            Some(request.instruction.clone()),
            vec![LlmMessage::user(request.text.clone())],
        )
        .with_max_tokens(max_tokens);

        let response = self.llm.complete(&llm_request).await?;
        Ok(response.text.trim().to_string())
    }
}

/// Adapter to use an `LlmService` as a `Responder`
#[derive(Clone)]
pub struct ModelResponder {
    llm: Arc<dyn LlmService>,
}

impl ModelResponder {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Responder for ModelResponder {
    async fn respond(&self, request: &RespondRequest) -> Result<String, LlmError> {
        let messages = request
            .history
            .iter()
            .map(|turn| LlmMessage {
                role: turn.role,
                text: turn.text.clone(),
            })
            .collect();
        let llm_request = LlmRequest::new(Some(request.system.clone()), messages);

        let response = self.llm.complete(&llm_request).await?;
        let text = response.text.trim();
        if text.is_empty() {
            return Err(LlmError::unknown("Empty response from model"));
        }
        Ok(text.to_string())
    }
}

/// Terminal console: reads lines from stdin, prints to stdout
pub struct StdioConsole {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    agent_label: String,
}

impl StdioConsole {
    pub fn new(agent_label: impl Into<String>) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            agent_label: agent_label.into(),
        }
    }
}

#[async_trait]
impl UserIo for StdioConsole {
    async fn read_line(&self) -> std::io::Result<Option<String>> {
        {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "\nYou: ")?;
            stdout.flush()?;
        }
        self.lines.lock().await.next_line().await
    }

    fn show(&self, text: &str) {
        println!("\n{}: {text}", self.agent_label);
    }
}
