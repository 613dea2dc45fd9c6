//! Provider selection for the live model

use super::{LlmError, LlmService, LoggingService, OpenAIService};
use std::sync::Arc;

/// Model used when `DEFAULT_MODEL` is unset
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for the live LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// Explicit API root for an OpenAI-compatible server
    pub openai_base_url: Option<String>,
    /// Gateway URL; requests go to `{gateway}/openai/v1` with an implicit key
    pub gateway: Option<String>,
    /// Default model ID
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_base_url: non_empty_var("OPENAI_BASE_URL"),
            gateway: non_empty_var("LLM_GATEWAY"),
            default_model: non_empty_var("DEFAULT_MODEL"),
        }
    }

    pub fn model_id(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn base_url(&self) -> Option<String> {
        self.openai_base_url.clone().or_else(|| {
            self.gateway
                .as_deref()
                .map(|gw| format!("{}/openai/v1", gw.trim_end_matches('/')))
        })
    }

    /// Construct the live service, wrapped with request logging.
    ///
    /// In gateway mode the key is `implicit`; the gateway authenticates.
    pub fn create_service(&self) -> Result<Arc<dyn LlmService>, LlmError> {
        let api_key = match (&self.openai_api_key, &self.gateway) {
            (Some(key), _) => key.clone(),
            (None, Some(_)) => "implicit".to_string(),
            (None, None) => {
                return Err(LlmError::auth(
                    "No LLM credentials configured. Set OPENAI_API_KEY or LLM_GATEWAY, or run with --mocked.",
                ))
            }
        };

        let base_url = self.base_url();
        let service = OpenAIService::new(api_key, self.model_id(), base_url.as_deref())?;
        Ok(Arc::new(LoggingService::new(Arc::new(service))))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
