//! Command-line and environment configuration

use crate::state_machine::state::DEFAULT_RETRY_CAP;
use crate::state_machine::{Subject, Variant};
use clap::builder::BoolishValueParser;
use clap::Parser;
use thiserror::Error;

/// Interactive conversational agent
#[derive(Parser, Debug, Clone)]
#[command(name = "prizm-agent", version)]
#[command(about = "Conversational productivity and vendor-intake agent")]
pub struct AgentConfig {
    /// Use the offline scripted model instead of the live API
    #[arg(long, env = "MOCK_MODE", value_parser = BoolishValueParser::new())]
    pub mocked: bool,

    /// Which conversation to run
    #[arg(long, env = "AGENT_VARIANT", value_enum, default_value_t = Variant::Productivity)]
    pub variant: Variant,

    /// Name of the user, if already known
    #[arg(long, env = "AGENT_USER_NAME")]
    pub name: Option<String>,

    /// Email of the user; kept for the session only
    #[arg(long, env = "AGENT_USER_EMAIL")]
    pub email: Option<String>,

    /// Ambiguous scheduling replies allowed before handing off to a human
    #[arg(long, env = "AGENT_RETRY_CAP", default_value_t = DEFAULT_RETRY_CAP)]
    pub retry_cap: u32,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "LOG_JSON", value_parser = BoolishValueParser::new())]
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("--retry-cap must be at least 1")]
    ZeroRetryCap,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("--name must not be blank")]
    BlankName,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_cap == 0 {
            return Err(ConfigError::ZeroRetryCap);
        }
        if let Some(email) = &self.email {
            let valid = email
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if !valid {
                return Err(ConfigError::InvalidEmail(email.clone()));
            }
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ConfigError::BlankName);
        }
        Ok(())
    }

    /// Caller-supplied identity for the new session
    pub fn subject(&self) -> Subject {
        Subject {
            name: self.name.as_ref().map(|n| n.trim().to_string()),
            email: self.email.clone(),
        }
    }
}
